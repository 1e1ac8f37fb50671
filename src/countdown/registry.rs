use chrono::{DateTime, Utc};
use serenity::all::MessageId;

use crate::countdown::record::CountdownRecord;
use crate::error::CountdownError;

/// Ordering used to resolve a 1-based position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionOrder {
    Insertion,
    Expiry,
}

/// In-memory set of one board's active countdowns, in insertion order.
#[derive(Debug, Default)]
pub struct Registry {
    records: Vec<CountdownRecord>,
}

impl Registry {
    /// Rebuild from a snapshot. No future check here: records that expired while the
    /// bot was down are retired by their lifecycle task on its first poll.
    pub fn from_records(records: Vec<CountdownRecord>) -> Self {
        let mut reg = Registry::default();
        for r in records {
            if reg.get(r.id).is_none() {
                reg.records.push(r);
            }
        }
        reg
    }

    pub fn add(&mut self, record: CountdownRecord, now: DateTime<Utc>) -> Result<(), CountdownError> {
        if record.expires_at <= now {
            return Err(CountdownError::NotInFuture);
        }
        if self.get(record.id).is_some() {
            return Err(CountdownError::AlreadyTracked(record.id));
        }
        self.records.push(record);
        Ok(())
    }

    pub fn remove(&mut self, id: MessageId) -> Result<CountdownRecord, CountdownError> {
        let pos = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or(CountdownError::NotTracked(id))?;
        Ok(self.records.remove(pos))
    }

    /// `index` is 1-based.
    pub fn remove_by_position(
        &mut self,
        index: usize,
        order: PositionOrder,
    ) -> Result<CountdownRecord, CountdownError> {
        let len = self.records.len();
        if index == 0 || index > len {
            return Err(CountdownError::InvalidPosition { index, len });
        }
        let id = match order {
            PositionOrder::Insertion => self.records[index - 1].id,
            PositionOrder::Expiry => self
                .list_sorted()
                .nth(index - 1)
                .map(|r| r.id)
                .ok_or(CountdownError::InvalidPosition { index, len })?,
        };
        self.remove(id)
    }

    pub fn get(&self, id: MessageId) -> Option<&CountdownRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Ascending by expiry; ties keep insertion order.
    pub fn list_sorted(&self) -> impl Iterator<Item = &CountdownRecord> + '_ {
        let mut refs: Vec<&CountdownRecord> = self.records.iter().collect();
        refs.sort_by_key(|r| r.expires_at);
        refs.into_iter()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CountdownRecord> + '_ {
        self.records.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countdown::record::Initiator;
    use chrono::Duration;
    use serenity::all::UserId;

    fn rec(id: u64, expires_at: DateTime<Utc>) -> CountdownRecord {
        CountdownRecord {
            id: MessageId::new(id),
            expires_at,
            initiator: Initiator::User(UserId::new(1)),
            label: String::new(),
            permalink: None,
        }
    }

    #[test]
    fn add_rejects_past_and_duplicate_records() {
        let now = Utc::now();
        let mut reg = Registry::default();
        assert!(matches!(reg.add(rec(1, now), now), Err(CountdownError::NotInFuture)));
        reg.add(rec(1, now + Duration::minutes(5)), now).unwrap();
        assert!(matches!(
            reg.add(rec(1, now + Duration::minutes(9)), now),
            Err(CountdownError::AlreadyTracked(_))
        ));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn list_sorted_is_by_expiry_and_stable() {
        let now = Utc::now();
        let mut reg = Registry::default();
        reg.add(rec(1, now + Duration::hours(3)), now).unwrap();
        reg.add(rec(2, now + Duration::hours(1)), now).unwrap();
        reg.add(rec(3, now + Duration::hours(3)), now).unwrap();
        reg.add(rec(4, now + Duration::hours(2)), now).unwrap();

        let ids: Vec<u64> = reg.list_sorted().map(|r| r.id.get()).collect();
        assert_eq!(ids, vec![2, 4, 1, 3]);
    }

    #[test]
    fn remove_by_position_uses_requested_order() {
        let now = Utc::now();
        let mut reg = Registry::default();
        reg.add(rec(1, now + Duration::hours(5)), now).unwrap();
        reg.add(rec(2, now + Duration::hours(1)), now).unwrap();

        let gone = reg.remove_by_position(1, PositionOrder::Expiry).unwrap();
        assert_eq!(gone.id.get(), 2);
        let gone = reg.remove_by_position(1, PositionOrder::Insertion).unwrap();
        assert_eq!(gone.id.get(), 1);
        assert!(reg.is_empty());
    }

    #[test]
    fn out_of_range_position_leaves_registry_unchanged() {
        let now = Utc::now();
        let mut reg = Registry::default();
        reg.add(rec(1, now + Duration::hours(1)), now).unwrap();
        reg.add(rec(2, now + Duration::hours(2)), now).unwrap();

        for bad in [0, 3, 5] {
            let err = reg.remove_by_position(bad, PositionOrder::Expiry).unwrap_err();
            assert!(matches!(err, CountdownError::InvalidPosition { len: 2, .. }));
        }
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn removing_an_absent_record_signals_not_tracked() {
        let mut reg = Registry::default();
        assert!(matches!(
            reg.remove(MessageId::new(77)),
            Err(CountdownError::NotTracked(_))
        ));
    }

    #[test]
    fn from_records_drops_duplicate_ids() {
        let now = Utc::now();
        let reg = Registry::from_records(vec![
            rec(1, now + Duration::hours(1)),
            rec(1, now + Duration::hours(2)),
            rec(2, now - Duration::hours(1)),
        ]);
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get(MessageId::new(1)).unwrap().expires_at, now + Duration::hours(1));
    }
}
