//! In-memory view of the active profile

use std::collections::HashSet;

use crate::domain::{FavoriteKey, FavoriteRef, Profile};

/// Who is playing and which items they have marked.
///
/// Replaced wholesale on login and logout; guest and account views are
/// never merged.
#[derive(Debug, Clone, Default)]
pub struct Session {
    profile: Profile,
    favorites: HashSet<FavoriteKey>,
}

impl Session {
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn replace(&mut self, profile: Profile, favorites: &[FavoriteRef]) {
        self.profile = profile;
        self.favorites = favorites.iter().map(FavoriteRef::key).collect();
    }

    pub fn insert(&mut self, profile: &Profile, key: FavoriteKey) {
        if &self.profile == profile {
            self.favorites.insert(key);
        }
    }

    pub fn remove(&mut self, profile: &Profile, key: &FavoriteKey) {
        if &self.profile == profile {
            self.favorites.remove(key);
        }
    }

    /// `None` when `profile` is not the one this view holds
    pub fn contains(&self, profile: &Profile, key: &FavoriteKey) -> Option<bool> {
        (&self.profile == profile).then(|| self.favorites.contains(key))
    }

    #[cfg(test)]
    pub fn favorite_count(&self) -> usize {
        self.favorites.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserIdentity;

    #[test]
    fn test_view_ignores_other_profiles() {
        let mut session = Session::default();
        let key = FavoriteKey::new("Pokemon X Y", "Route 4");
        let other = Profile::Account(UserIdentity {
            id: "u9".into(),
            email: "x@example.com".into(),
        });

        session.insert(&other, key.clone());
        assert_eq!(session.contains(&Profile::Guest, &key), Some(false));
        assert_eq!(session.contains(&other, &key), None);

        session.insert(&Profile::Guest, key.clone());
        assert_eq!(session.contains(&Profile::Guest, &key), Some(true));
        assert_eq!(session.favorite_count(), 1);
    }
}
