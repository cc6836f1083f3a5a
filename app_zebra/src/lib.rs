//! Counts how many school level names end in each two-letter suffix.
//!
//! Input rows are `id<sep>level name`, e.g. `5<sep>3rd`.

use anyhow::Context;
use itertools::Itertools;
use stripes::{record, Acc, Collect, Job, Key, Record, Sink};

pub struct Zebra;

/// The last two characters of `name`, or all of it when shorter.
pub fn suffix(name: &str) -> String {
    let skip = name.chars().count().saturating_sub(2);
    name.chars().skip(skip).collect()
}

impl Job for Zebra {
    type Aggregator = Collect;

    fn aggregator(&self) -> &Collect {
        &Collect
    }

    fn map(&mut self, record: Record, out: &mut dyn Sink) -> anyhow::Result<()> {
        let level_name = record.field(1)?;
        out.emit(record![suffix(level_name), 1])?;
        Ok(())
    }

    fn reduce(&mut self, key: &Key, acc: Acc<Self>, out: &mut dyn Sink) -> anyhow::Result<()> {
        let total = acc
            .iter()
            .map(|value| {
                let count = value.first().context("empty count")?;
                count
                    .parse::<i64>()
                    .with_context(|| format!("bad count {count:?}"))
            })
            .fold_ok(0, |sum, n| sum + n)?;
        let mut fields = key.clone();
        fields.push(total.to_string());
        out.emit(Record::from(fields))?;
        Ok(())
    }

    fn combine(&mut self, key: &Key, acc: Acc<Self>, out: &mut dyn Sink) -> anyhow::Result<()> {
        self.reduce(key, acc, out)
    }

    fn has_combiner(&self) -> bool {
        true
    }
}
