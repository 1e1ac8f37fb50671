//! Reconciliation of guild-bank deposit exports (`;` separated CSV).

use std::collections::HashMap;

use anyhow::Result;

use crate::ui::tables::{Align, Table};

const GUILD: usize = 2;
const USER: usize = 3;
const ITEM: usize = 5;
const QUANTITY: usize = 6;

/// Distinct `(item, quantity)` deposits of one member, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDeposits {
    pub user: String,
    pub items: Vec<(String, String)>,
}

/// Group the rows of one export by member, keeping only rows whose guild is in
/// `guilds` (lower-case names).
pub fn reconcile(data: &[u8], guilds: &[String]) -> Result<Vec<MemberDeposits>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let mut members: Vec<MemberDeposits> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for record in reader.records() {
        let record = record?;
        let (Some(guild), Some(user), Some(item), Some(quantity)) =
            (record.get(GUILD), record.get(USER), record.get(ITEM), record.get(QUANTITY))
        else {
            continue;
        };
        if !guilds.iter().any(|g| *g == guild.to_lowercase()) {
            continue;
        }

        let slot = *index.entry(user.to_string()).or_insert_with(|| {
            members.push(MemberDeposits { user: user.to_string(), items: Vec::new() });
            members.len() - 1
        });
        let entry = (item.to_string(), quantity.to_string());
        if !members[slot].items.contains(&entry) {
            members[slot].items.push(entry);
        }
    }
    Ok(members)
}

pub fn deposits_table(members: &[MemberDeposits]) -> String {
    let mut table = Table::new([
        "User",
        "Undepo\nItems\nCount",
        "Undepo Items Names\n+count for each item\n( number )",
    ])
    .align(1, Align::Right);
    for (n, m) in members.iter().filter(|m| !m.items.is_empty()).enumerate() {
        let names: Vec<String> = m.items.iter().map(|(item, qty)| format!("{item} ( {qty} )")).collect();
        table.row([format!("({}) - [ {} ]", n + 1, m.user), m.items.len().to_string(), names.join("\n")]);
    }
    table.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "\
Date;Location;Guild;Player;Tier;Item;Quantity
d;l;Smurfing Monkeys;ann;4;Sword;1
d;l;Smurfing Monkeys;ann;4;Sword;1
d;l;Surfing Penguins;bob;5;Bow;2
d;l;Strangers;eve;6;Axe;9
d;l;SMURFING MONKEYS;ann;4;Cape;3
short;row
";

    fn guilds() -> Vec<String> {
        vec!["smurfing monkeys".into(), "surfing penguins".into()]
    }

    #[test]
    fn groups_distinct_items_per_member() {
        let members = reconcile(EXPORT.as_bytes(), &guilds()).unwrap();
        assert_eq!(
            members,
            vec![
                MemberDeposits {
                    user: "ann".into(),
                    items: vec![("Sword".into(), "1".into()), ("Cape".into(), "3".into())],
                },
                MemberDeposits { user: "bob".into(), items: vec![("Bow".into(), "2".into())] },
            ]
        );
    }

    #[test]
    fn table_numbers_members() {
        let out = deposits_table(&reconcile(EXPORT.as_bytes(), &guilds()).unwrap());
        assert!(out.contains("(1) - [ ann ]"));
        assert!(out.contains("(2) - [ bob ]"));
        assert!(out.contains("Cape ( 3 )"));
        assert!(!out.contains("eve"));
    }

    #[test]
    fn header_only_export_is_empty() {
        let members = reconcile(b"Date;Location;Guild;Player;Tier;Item;Quantity\n", &guilds()).unwrap();
        assert!(members.is_empty());
    }
}
