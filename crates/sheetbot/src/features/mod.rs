//! Feature leaves and the tree that wires them together

pub mod bus;
pub mod friends;
pub mod game;
pub mod general;
pub mod profile;

use std::sync::{Arc, OnceLock};

use sheetcore::feature::FeatureTreeError;
use sheetcore::{FeatureTree, SheetBackend};

use bus::{BusArrivalSource, FavouriteStops};
use friends::FriendStore;
use game::GameStore;
use general::Menu;
use profile::UserDirectory;

/// External collaborators the features need.
#[derive(Clone)]
pub struct FeatureDeps {
    pub backend: Arc<dyn SheetBackend>,
    pub bus_source: Arc<dyn BusArrivalSource>,
    pub words: Vec<String>,
}

impl FeatureDeps {
    pub fn new(backend: Arc<dyn SheetBackend>, bus_source: Arc<dyn BusArrivalSource>) -> Self {
        Self {
            backend,
            bus_source,
            words: game::DEFAULT_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }

    pub fn with_words(mut self, words: Vec<String>) -> Self {
        self.words = words;
        self
    }
}

/// Builds and validates the full command tree.
pub fn build_tree(deps: FeatureDeps) -> Result<FeatureTree, FeatureTreeError> {
    let users = UserDirectory::new(deps.backend.clone());
    let menu = Arc::new(OnceLock::new());

    let mut roots = general::features(menu.clone(), users.clone());
    roots.push(bus::feature(deps.bus_source, FavouriteStops::new(deps.backend.clone())));
    roots.push(game::feature(GameStore::new(deps.backend.clone()), deps.words));
    roots.push(friends::feature(FriendStore::new(deps.backend.clone()), users.clone()));
    roots.push(profile::feature(users));

    let tree = FeatureTree::new(roots)?;
    if menu.set(Menu::from_tree(&tree)).is_err() {
        log::warn!("Command menu was already built, keeping the first one");
    }
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sheetcore::{AppResult, MemoryBackend};

    struct NoBuses;

    #[async_trait]
    impl BusArrivalSource for NoBuses {
        async fn arrivals(&self, _stop_code: &str) -> AppResult<Vec<bus::ServiceArrival>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_build_tree_roots() {
        let deps = FeatureDeps::new(Arc::new(MemoryBackend::new()), Arc::new(NoBuses));
        let tree = build_tree(deps).unwrap();
        let words: Vec<&str> = tree.roots().iter().map(|f| f.command_word.as_str()).collect();
        assert_eq!(words, vec!["start", "help", "cancel", "bus", "game", "friends", "profile"]);
    }

    #[test]
    fn test_every_leaf_has_help() {
        let deps = FeatureDeps::new(Arc::new(MemoryBackend::new()), Arc::new(NoBuses));
        let tree = build_tree(deps).unwrap();
        let leaves = tree.leaves();
        assert!(leaves.iter().any(|(path, _)| path == "bus bus_stop"));
        assert!(leaves.iter().any(|(path, _)| path == "friends accept"));
        assert!(leaves.iter().all(|(_, help)| !help.is_empty()));
    }

    #[tokio::test]
    async fn test_help_and_start_see_the_built_menu() {
        use sheetcore::testing::RecordingSender;
        use sheetcore::{ChatUser, CommandRouter, CommandStateStore};

        let backend: Arc<dyn SheetBackend> = Arc::new(MemoryBackend::new());
        let tree = build_tree(FeatureDeps::new(backend.clone(), Arc::new(NoBuses))).unwrap();
        let router = CommandRouter::new(Arc::new(tree), CommandStateStore::new(backend));
        let sender = RecordingSender::new();
        let user = ChatUser::new(1, "Ann");

        router.dispatch("/help", &user, 1, &sender).await.unwrap();
        assert!(sender.last_text().unwrap().starts_with("*Commands*"));

        router.dispatch("/start", &user, 1, &sender).await.unwrap();
        assert!(sender.last_text().unwrap().contains("*Available commands*"));
    }
}
