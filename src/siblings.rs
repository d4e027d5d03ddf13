#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Siblings {
    pub prev: String,
    pub next: String,
}

/// Find the dishes around `current` in `ids`, wrapping at both ends.
///
/// Returns `None` when the list is empty or does not contain `current`.
pub fn siblings(current: &str, ids: &[String]) -> Option<Siblings> {
    let index = ids.iter().position(|id| id == current)?;
    let len = ids.len();

    Some(Siblings {
        prev: ids[(len + index - 1) % len].clone(),
        next: ids[(index + 1) % len].clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_wrap_to_end() {
        let s = siblings("a", &ids(&["a", "b", "c"])).unwrap();
        assert_eq!(s.prev, "c");
        assert_eq!(s.next, "b");
    }

    #[test]
    fn test_wrap_to_start() {
        let s = siblings("103", &ids(&["101", "102", "103"])).unwrap();
        assert_eq!(s.prev, "102");
        assert_eq!(s.next, "101");
    }

    #[test]
    fn test_middle_distinct() {
        let list = ids(&["0", "1", "2", "3"]);
        let s = siblings("2", &list).unwrap();
        assert_eq!(s.prev, "1");
        assert_eq!(s.next, "3");
        assert_ne!(s.prev, s.next);
    }

    #[test]
    fn test_single_points_to_itself() {
        let s = siblings("only", &ids(&["only"])).unwrap();
        assert_eq!(s.prev, "only");
        assert_eq!(s.next, "only");
    }

    #[test]
    fn test_two_entries() {
        let s = siblings("x", &ids(&["x", "y"])).unwrap();
        assert_eq!(s.prev, "y");
        assert_eq!(s.next, "y");
    }

    #[test]
    fn test_empty_or_absent() {
        assert_eq!(siblings("a", &[]), None);
        assert_eq!(siblings("z", &ids(&["a", "b"])), None);
    }
}
