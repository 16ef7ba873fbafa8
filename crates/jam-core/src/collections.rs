//! Role-resolved view of the store's collections.
//!
//! Roles are resolved once when the collection list is loaded; everything
//! downstream asks for a role, never for a display name.

use crate::models::{Collection, CollectionId, CollectionMetadata, CollectionRole};

/// The selectable collections known to a session, in store order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionDirectory {
    collections: Vec<Collection>,
}

impl CollectionDirectory {
    /// Resolve roles and drop ignored collections.
    pub fn resolve(listed: impl IntoIterator<Item = CollectionMetadata>) -> Self {
        let collections = listed
            .into_iter()
            .map(Collection::from)
            .filter(|c| c.role.is_selectable())
            .collect();
        Self { collections }
    }

    pub fn selectable(&self) -> &[Collection] {
        &self.collections
    }

    /// Collection shown when a session opens.
    pub fn initial(&self) -> Option<&Collection> {
        self.collections.first()
    }

    pub fn get(&self, id: CollectionId) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id == id)
    }

    /// First collection carrying `role`.
    pub fn by_role(&self, role: CollectionRole) -> Option<&Collection> {
        self.collections.iter().find(|c| c.role == role)
    }

    pub fn my_list(&self) -> Option<CollectionId> {
        self.by_role(CollectionRole::MyList).map(|c| c.id)
    }

    pub fn liked(&self) -> Option<CollectionId> {
        self.by_role(CollectionRole::Liked).map(|c| c.id)
    }

    /// Where moves out of `source` go: My List moves to Liked, every other
    /// collection moves to My List.
    pub fn destination_for(&self, source: CollectionId) -> Option<CollectionId> {
        if Some(source) == self.my_list() {
            self.liked()
        } else {
            self.my_list()
        }
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults;

    fn meta(name: &str) -> CollectionMetadata {
        CollectionMetadata {
            id: CollectionId::new_v4(),
            collection_name: name.to_string(),
        }
    }

    #[test]
    fn test_ignore_list_is_filtered_out() {
        let ignored = meta(defaults::IGNORE_LIST_NAME);
        let ignored_id = ignored.id;
        let dir = CollectionDirectory::resolve(vec![
            ignored,
            meta(defaults::MY_LIST_NAME),
            meta(defaults::LIKED_LIST_NAME),
        ]);
        assert_eq!(dir.len(), 2);
        assert!(dir.get(ignored_id).is_none());
        assert!(dir.by_role(CollectionRole::Ignored).is_none());
    }

    #[test]
    fn test_initial_is_first_selectable() {
        let my_list = meta(defaults::MY_LIST_NAME);
        let my_list_id = my_list.id;
        let dir = CollectionDirectory::resolve(vec![
            meta(defaults::IGNORE_LIST_NAME),
            my_list,
            meta(defaults::LIKED_LIST_NAME),
        ]);
        assert_eq!(dir.initial().map(|c| c.id), Some(my_list_id));
    }

    #[test]
    fn test_destination_policy() {
        let my_list = meta(defaults::MY_LIST_NAME);
        let liked = meta(defaults::LIKED_LIST_NAME);
        let other = meta("Portfolio");
        let (my_id, liked_id, other_id) = (my_list.id, liked.id, other.id);
        let dir = CollectionDirectory::resolve(vec![my_list, liked, other]);

        assert_eq!(dir.destination_for(my_id), Some(liked_id));
        assert_eq!(dir.destination_for(liked_id), Some(my_id));
        assert_eq!(dir.destination_for(other_id), Some(my_id));
    }

    #[test]
    fn test_destination_missing_when_role_unresolved() {
        let my_list = meta(defaults::MY_LIST_NAME);
        let my_id = my_list.id;
        let dir = CollectionDirectory::resolve(vec![my_list]);
        assert_eq!(dir.destination_for(my_id), None);
    }

    #[test]
    fn test_empty_directory() {
        let dir = CollectionDirectory::resolve(Vec::new());
        assert!(dir.is_empty());
        assert!(dir.initial().is_none());
        assert!(dir.my_list().is_none());
    }
}
