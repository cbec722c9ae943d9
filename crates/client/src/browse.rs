//! Continuation points of the most recent browse.

use parking_lot::Mutex;
use ua_types::ByteString;
use ua_types::service::view::BrowseResult;

/// The outstanding continuation points.
///
/// The set is only ever cleared and refilled as a whole, so a later
/// continuation call can never see tokens of an earlier browse.
#[derive(Debug, Default)]
pub(crate) struct ContinuationPoints {
    points: Mutex<Vec<ByteString>>,
}

impl ContinuationPoints {
    /// Replace the set with the non-empty tokens in `results`.
    pub fn replace_from(&self, results: &[BrowseResult]) {
        let points = results
            .iter()
            .filter(|result| !result.continuation_point.is_empty())
            .map(|result| result.continuation_point.clone())
            .collect();
        *self.points.lock() = points;
    }

    /// Empty the set and return what it held.
    pub fn take(&self) -> Vec<ByteString> {
        std::mem::take(&mut *self.points.lock())
    }

    pub fn clear(&self) {
        self.points.lock().clear();
    }

    pub fn snapshot(&self) -> Vec<ByteString> {
        self.points.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(point: &[u8]) -> BrowseResult {
        BrowseResult {
            continuation_point: ByteString::from(point),
            ..Default::default()
        }
    }

    #[test]
    fn test_replace_never_merges() {
        let points = ContinuationPoints::default();
        points.replace_from(&[result(b"a"), result(b""), result(b"b")]);
        assert_eq!(
            points.snapshot(),
            vec![ByteString::from(&b"a"[..]), ByteString::from(&b"b"[..])]
        );

        points.replace_from(&[result(b"c")]);
        assert_eq!(points.snapshot(), vec![ByteString::from(&b"c"[..])]);

        points.replace_from(&[result(b"")]);
        assert!(points.snapshot().is_empty());
    }

    #[test]
    fn test_take_empties_set() {
        let points = ContinuationPoints::default();
        points.replace_from(&[result(b"a")]);

        assert_eq!(points.take().len(), 1);
        assert!(points.take().is_empty());
    }
}
