use serenity::all::{Colour, CreateEmbed};

use crate::countdown::render::SummaryView;

pub fn summary_embed(view: &SummaryView) -> CreateEmbed {
    CreateEmbed::new()
        .title(&view.title)
        .description(&view.description)
        .colour(Colour::BLUE)
        .fields(view.entries.iter().map(|e| (e.name.clone(), e.value.clone(), false)))
}

/* (usage, what it does) */
const HELP: &[(&str, &str)] = &[
    ("content_in <HH:MM> [label]", "Start a countdown ending in HH:MM."),
    ("wb <YYYY-MM-DD> <HH:MM> [label]", "Start a world boss countdown from a UTC date and time."),
    ("remove <n>", "Remove the n-th countdown of the list."),
    ("remove_wb <n>", "Remove the n-th world boss countdown."),
    ("signup <ign_username>", "Allows users to sign up with their in-game username."),
    ("delete_user <@user1> <@user2> ...", "Allows admins to delete users from the database."),
    ("add (<amount>) (<user_names>) (<tax_percentage>)", "Add money to the loot split."),
    ("payout (<user_names>)", "Initiate a payout to users."),
    ("ball <user_name>", "Check the total amount for a user."),
    ("add_link <amount> <link>", "Fetch participant names from the provided link and add them to the database."),
    ("log <player>", "Show a player's deposit log."),
    ("total_logger [sheet key]", "Totals per player and guild from the deposit sheet."),
    ("loot_logger", "Reconcile attached deposit CSV exports (officers)."),
];

pub fn help_embed(prefix: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title("Bot Commands")
        .description("List of available commands and their usage:")
        .colour(Colour::BLUE)
        .fields(
            HELP.iter()
                .map(|(usage, what)| (format!("__**{prefix}{usage}**__"), what.to_string(), false)),
        )
}
