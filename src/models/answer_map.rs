/// Mapping from question number to a single selected-option letter.
///
/// Insertion order is preserved because it drives the order of the
/// per-question `details` array in the response. Lookups are linear;
/// answer sheets are small enough that this beats hashing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerMap {
    entries: Vec<(String, String)>,
}

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a pair. A repeated question keeps its original position
    /// but takes the new answer (last write wins).
    pub fn insert(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        let question = question.into();
        let answer = answer.into();
        if let Some(entry) = self.entries.iter_mut().find(|(q, _)| *q == question) {
            entry.1 = answer;
        } else {
            self.entries.push((question, answer));
        }
    }

    pub fn get(&self, question: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(q, _)| q == question)
            .map(|(_, a)| a.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(q, a)| (q.as_str(), a.as_str()))
    }
}

impl FromIterator<(String, String)> for AnswerMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut map = AnswerMap::new();
        for (q, a) in iter {
            map.insert(q, a);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_overwrites_but_keeps_position() {
        let mut map = AnswerMap::new();
        map.insert("1", "A");
        map.insert("2", "B");
        map.insert("1", "C");

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("1"), Some("C"));
        let order: Vec<&str> = map.iter().map(|(q, _)| q).collect();
        assert_eq!(order, vec!["1", "2"]);
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let map: AnswerMap = [("3", "C"), ("1", "A"), ("10", "D")]
            .into_iter()
            .map(|(q, a)| (q.to_string(), a.to_string()))
            .collect();

        let order: Vec<&str> = map.iter().map(|(q, _)| q).collect();
        assert_eq!(order, vec!["3", "1", "10"]);
    }
}
