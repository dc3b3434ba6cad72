use std::{collections::BTreeSet, fs, path::Path};

use crate::{
    error::LResult,
    models::{Meta, TrainSnapshot},
    parsing,
};

/// One decoded live map snapshot: the snapshot-wide metadata and the
/// ordered train records. Decoding is a pure function of the input bytes;
/// the value owns its data and carries no handle back to the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Livemap {
    meta: Meta,
    trains: Vec<TrainSnapshot>,
}

impl Livemap {
    /// Decodes a raw snapshot document.
    pub fn decode(bytes: &[u8]) -> LResult<Self> {
        let (meta, trains) = parsing::parse_snapshot(bytes)?;
        Ok(Self { meta, trains })
    }

    /// Reads and decodes a snapshot file.
    pub fn from_file(path: impl AsRef<Path>) -> LResult<Self> {
        let bytes = fs::read(path)?;
        Self::decode(&bytes)
    }

    // Getters/Setters

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn trains(&self) -> &[TrainSnapshot] {
        &self.trains
    }

    /// Trains passing the class filter and the optional train-number
    /// filter. An empty class set disables class filtering. The number must
    /// equal a whole whitespace-separated token of the train name, so a
    /// bare "4" does not match train "IC 104".
    pub fn matching<'a>(
        &'a self,
        classes: &'a BTreeSet<u32>,
        number: Option<&'a str>,
    ) -> impl Iterator<Item = &'a TrainSnapshot> + 'a {
        self.trains.iter().filter(move |train| {
            if !classes.is_empty() && !classes.contains(&train.class()) {
                return false;
            }
            match number {
                Some(number) => train.name().split_whitespace().any(|token| token == number),
                None => true,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrainClass;
    use pretty_assertions::assert_eq;

    const SAMPLE_SNAPSHOT: &[u8] = b"[[\
        [\"IC 104\",1,2,\"a/1\",90,1,0,\"K\",[1,2,3,4,5],\"A\",1,\"B\",2,\"08.08.26\"],\
        [\"ICL 41\",1,2,\"b/2\",90,2,0,\"K\",[1,2,3,4,5],\"A\",1,\"B\",2,\"08.08.26\"],\
        [\"Re 2345\",1,2,\"c/3\",90,4,0,\"K\",[1,2,3,4,5],\"A\",1,\"B\",2,\"08.08.26\"],\
        [\"08.08.26 18:07:24\",3,20000,5,\"5.40\"]\
        ],[]]";

    fn sample() -> Livemap {
        Livemap::decode(SAMPLE_SNAPSHOT).unwrap()
    }

    #[test]
    fn test_decode_keeps_train_order() {
        let livemap = sample();
        assert_eq!(livemap.trains().len(), 3);
        assert_eq!(livemap.meta().interval(), 20000);
        let names: Vec<&str> = livemap.trains().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["IC 104", "ICL 41", "Re 2345"]);
    }

    #[test]
    fn test_matching_filters_by_class() {
        let livemap = sample();
        let filter = TrainClass::default_filter();
        let names: Vec<&str> = livemap.matching(&filter, None).map(|t| t.name()).collect();
        assert_eq!(names, vec!["IC 104", "ICL 41"]);
    }

    #[test]
    fn test_empty_class_set_disables_class_filtering() {
        let livemap = sample();
        let filter = BTreeSet::new();
        assert_eq!(livemap.matching(&filter, None).count(), 3);
    }

    #[test]
    fn test_number_matches_whole_tokens_only() {
        let livemap = sample();
        let filter = BTreeSet::new();
        let names: Vec<&str> = livemap
            .matching(&filter, Some("104"))
            .map(|t| t.name())
            .collect();
        assert_eq!(names, vec!["IC 104"]);
        assert_eq!(livemap.matching(&filter, Some("04")).count(), 0);
    }

    #[test]
    fn test_class_and_number_filters_combine() {
        let livemap = sample();
        let filter = BTreeSet::from([TrainClass::Regional.bit()]);
        assert_eq!(livemap.matching(&filter, Some("104")).count(), 0);
        assert_eq!(livemap.matching(&filter, Some("2345")).count(), 1);
    }
}
