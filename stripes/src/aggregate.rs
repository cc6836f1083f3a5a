//! Folding the value fragments of one key group into an accumulator.

use std::marker::PhantomData;

use anyhow::Context;

/// Reduces the value fragments of a group, one fragment at a time.
///
/// `acc` is `None` for the first fragment of every group and must be `Some`
/// after a successful call. On error `acc` must be left as it was: the
/// offending record is skipped and the group stays open.
pub trait Aggregator {
    type Acc;

    fn aggregate(&self, acc: &mut Option<Self::Acc>, value: Vec<String>) -> anyhow::Result<()>;
}

/// Keeps every fragment, in encounter order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Collect;

impl Aggregator for Collect {
    type Acc = Vec<Vec<String>>;

    fn aggregate(&self, acc: &mut Option<Self::Acc>, value: Vec<String>) -> anyhow::Result<()> {
        acc.get_or_insert_with(Vec::new).push(value);
        Ok(())
    }
}

/// Sums the integer in the first field of each fragment.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountSum;

impl Aggregator for CountSum {
    type Acc = i64;

    fn aggregate(&self, acc: &mut Option<Self::Acc>, value: Vec<String>) -> anyhow::Result<()> {
        let raw = value.first().context("count fragment has no fields")?;
        let n: i64 = raw
            .trim()
            .parse()
            .with_context(|| format!("count {raw:?} is not an integer"))?;
        let sum = acc
            .unwrap_or(0)
            .checked_add(n)
            .context("count overflowed")?;
        *acc = Some(sum);
        Ok(())
    }
}

/// Adapts a closure into an [`Aggregator`].
///
/// ```
/// use stripes::{AggregateFn, Aggregator};
/// let max = AggregateFn::new(|acc: &mut Option<i64>, v: Vec<String>| -> anyhow::Result<()> {
///     let n: i64 = v[0].parse()?;
///     *acc = Some(acc.map_or(n, |m| m.max(n)));
///     Ok(())
/// });
/// let mut acc = None;
/// max.aggregate(&mut acc, vec!["3".into()]).unwrap();
/// max.aggregate(&mut acc, vec!["7".into()]).unwrap();
/// max.aggregate(&mut acc, vec!["5".into()]).unwrap();
/// assert_eq!(acc, Some(7));
/// ```
pub struct AggregateFn<A, F> {
    f: F,
    _acc: PhantomData<fn(&mut Option<A>)>,
}

impl<A, F> AggregateFn<A, F>
where
    F: Fn(&mut Option<A>, Vec<String>) -> anyhow::Result<()>,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _acc: PhantomData,
        }
    }
}

impl<A, F> Aggregator for AggregateFn<A, F>
where
    F: Fn(&mut Option<A>, Vec<String>) -> anyhow::Result<()>,
{
    type Acc = A;

    fn aggregate(&self, acc: &mut Option<A>, value: Vec<String>) -> anyhow::Result<()> {
        (self.f)(acc, value)
    }
}
