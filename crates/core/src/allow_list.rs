use std::collections::HashSet;

/// Set of user ids allowed to drive the bot.
///
/// Events from anyone else are dropped before a job is created. An empty
/// list authorizes nobody.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    user_ids: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(user_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_ids: user_ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a comma-separated list, ignoring blanks and surrounding spaces.
    pub fn from_csv(csv: &str) -> Self {
        Self::new(
            csv.split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty()),
        )
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.user_ids.contains(user_id)
    }

    pub fn len(&self) -> usize {
        self.user_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.user_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_parsing_trims_and_skips_blanks() {
        let list = AllowList::from_csv(" U1, U2,,U3 ,");
        assert_eq!(list.len(), 3);
        assert!(list.contains("U1"));
        assert!(list.contains("U2"));
        assert!(list.contains("U3"));
        assert!(!list.contains(""));
    }

    #[test]
    fn empty_list_allows_nobody() {
        let list = AllowList::from_csv("");
        assert!(list.is_empty());
        assert!(!list.contains("U1"));
    }

    #[test]
    fn membership_is_exact() {
        let list = AllowList::new(["Uabc"]);
        assert!(list.contains("Uabc"));
        assert!(!list.contains("uabc"));
        assert!(!list.contains("Uab"));
    }
}
