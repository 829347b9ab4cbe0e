//! Columnar observation collectors.
//!
//! Each collector buffers rows of named, typed fields but hands them out
//! column-oriented: one typed vector per field. Taking the observations
//! moves the vectors out (zero copy) and leaves the collector empty; the
//! required-observations quota is kept.

use std::mem;

use crate::types::Time;

/// One typed observation column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    U32(Vec<u32>),
    U64(Vec<u64>),
    F64(Vec<f64>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::U32(v) => v.len(),
            Column::U64(v) => v.len(),
            Column::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_u32(&self) -> Option<&[u32]> {
        match self {
            Column::U32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<&[u64]> {
        match self {
            Column::U64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<&[f64]> {
        match self {
            Column::F64(v) => Some(v),
            _ => None,
        }
    }
}

/// A named set of equally long observation columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observations {
    columns: Vec<(&'static str, Column)>,
}

impl Observations {
    pub(crate) fn new(columns: Vec<(&'static str, Column)>) -> Self {
        debug_assert!(
            columns.windows(2).all(|w| w[0].1.len() == w[1].1.len()),
            "observation columns must have equal lengths"
        );
        Observations { columns }
    }

    /// Look up a column by its literal field name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| c)
    }

    /// Column names in field order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|(n, _)| *n)
    }

    /// Number of collected rows.
    pub fn rows(&self) -> usize {
        self.columns.first().map_or(0, |(_, c)| c.len())
    }

    pub fn is_empty(&self) -> bool {
        self.rows() == 0
    }
}

/// Collector for the `token_visits` stream: one row per completed visit of
/// a token at a place.
#[derive(Debug)]
pub(crate) struct TokenVisitCollector {
    required: usize,
    token_id: Vec<u64>,
    token_type: Vec<u32>,
    start_time: Vec<f64>,
    visit_number: Vec<u64>,
    place: Vec<u32>,
    duration: Vec<f64>,
}

impl TokenVisitCollector {
    pub fn new(required: usize) -> Self {
        TokenVisitCollector {
            required,
            token_id: Vec::new(),
            token_type: Vec::new(),
            start_time: Vec::new(),
            visit_number: Vec::new(),
            place: Vec::new(),
            duration: Vec::new(),
        }
    }

    pub fn collect(
        &mut self,
        token_id: u64,
        token_type: u32,
        start_time: Time,
        visit_number: u64,
        place: u32,
        duration: Time,
    ) {
        self.token_id.push(token_id);
        self.token_type.push(token_type);
        self.start_time.push(start_time);
        self.visit_number.push(visit_number);
        self.place.push(place);
        self.duration.push(duration);
    }

    pub fn need_more(&self) -> bool {
        self.token_id.len() < self.required
    }

    pub fn set_required(&mut self, required: usize) {
        self.required = required;
    }

    pub fn take(&mut self) -> Observations {
        Observations::new(vec![
            ("token_id", Column::U64(mem::take(&mut self.token_id))),
            ("token_type", Column::U32(mem::take(&mut self.token_type))),
            ("start_time", Column::F64(mem::take(&mut self.start_time))),
            ("visit_number", Column::U64(mem::take(&mut self.visit_number))),
            ("place", Column::U32(mem::take(&mut self.place))),
            ("duration", Column::F64(mem::take(&mut self.duration))),
        ])
    }
}

/// Collector for the `place_population` stream: one row per interval during
/// which a place held a constant number of tokens.
#[derive(Debug)]
pub(crate) struct PlacePopulationCollector {
    required: usize,
    start_time: Vec<f64>,
    place: Vec<u32>,
    count: Vec<u64>,
    duration: Vec<f64>,
}

impl PlacePopulationCollector {
    pub fn new(required: usize) -> Self {
        PlacePopulationCollector {
            required,
            start_time: Vec::new(),
            place: Vec::new(),
            count: Vec::new(),
            duration: Vec::new(),
        }
    }

    pub fn collect(&mut self, start_time: Time, place: u32, count: u64, duration: Time) {
        self.start_time.push(start_time);
        self.place.push(place);
        self.count.push(count);
        self.duration.push(duration);
    }

    pub fn need_more(&self) -> bool {
        self.start_time.len() < self.required
    }

    pub fn set_required(&mut self, required: usize) {
        self.required = required;
    }

    pub fn take(&mut self) -> Observations {
        Observations::new(vec![
            ("start_time", Column::F64(mem::take(&mut self.start_time))),
            ("place", Column::U32(mem::take(&mut self.place))),
            ("count", Column::U64(mem::take(&mut self.count))),
            ("duration", Column::F64(mem::take(&mut self.duration))),
        ])
    }
}

/// Collector for the `transition_firing` stream: one row per firing.
#[derive(Debug)]
pub(crate) struct FiringCollector {
    required: usize,
    transition: Vec<u32>,
    firing_time: Vec<f64>,
    interval: Vec<f64>,
}

impl FiringCollector {
    pub fn new(required: usize) -> Self {
        FiringCollector {
            required,
            transition: Vec::new(),
            firing_time: Vec::new(),
            interval: Vec::new(),
        }
    }

    pub fn collect(&mut self, transition: u32, firing_time: Time, interval: Time) {
        self.transition.push(transition);
        self.firing_time.push(firing_time);
        self.interval.push(interval);
    }

    pub fn need_more(&self) -> bool {
        self.transition.len() < self.required
    }

    pub fn set_required(&mut self, required: usize) {
        self.required = required;
    }

    pub fn take(&mut self) -> Observations {
        Observations::new(vec![
            ("transition", Column::U32(mem::take(&mut self.transition))),
            ("firing_time", Column::F64(mem::take(&mut self.firing_time))),
            ("interval", Column::F64(mem::take(&mut self.interval))),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_and_take() {
        let mut c = FiringCollector::new(2);
        assert!(c.need_more());
        c.collect(0, 1.0, 1.0);
        assert!(c.need_more());
        c.collect(1, 2.5, 1.5);
        assert!(!c.need_more());

        let obs = c.take();
        assert_eq!(obs.rows(), 2);
        assert_eq!(
            obs.names().collect::<Vec<_>>(),
            vec!["transition", "firing_time", "interval"]
        );
        assert_eq!(obs.column("transition").unwrap().as_u32(), Some(&[0, 1][..]));
        assert_eq!(
            obs.column("interval").unwrap().as_f64(),
            Some(&[1.0, 1.5][..])
        );

        // Taking drains the buffers but keeps the quota.
        assert!(c.need_more());
        assert_eq!(c.take().rows(), 0);
    }

    #[test]
    fn test_quota_override() {
        let mut c = TokenVisitCollector::new(1);
        c.collect(0, 0, 0.0, 1, 0, 1.0);
        assert!(!c.need_more());
        c.set_required(3);
        assert!(c.need_more());
    }

    #[test]
    fn test_token_visit_column_names() {
        let mut c = TokenVisitCollector::new(1);
        c.collect(7, 1, 0.5, 2, 3, 0.25);
        let obs = c.take();
        assert_eq!(
            obs.names().collect::<Vec<_>>(),
            vec![
                "token_id",
                "token_type",
                "start_time",
                "visit_number",
                "place",
                "duration"
            ]
        );
        assert_eq!(obs.column("token_id").unwrap().as_u64(), Some(&[7][..]));
        assert_eq!(obs.column("place").unwrap().as_u32(), Some(&[3][..]));
        assert!(obs.column("no_such_column").is_none());
    }
}
