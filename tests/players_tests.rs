use battleship_server::{LeaderboardEntry, PlayerId, PlayerStore, ServerError};

#[test]
fn test_register_assigns_fresh_ids() {
    let store = PlayerStore::new();
    let alice = store.register("Alice");
    let again = store.register("Alice");
    assert_ne!(alice.id, again.id);
    assert_eq!(alice.wins, 0);
    assert_eq!(store.len(), 2);
    assert_eq!(store.get(alice.id).unwrap(), alice);
    assert_eq!(store.name(again.id).unwrap(), "Alice");
}

#[test]
fn test_unknown_player_is_an_error() {
    let store = PlayerStore::new();
    let ghost = PlayerId::new();
    assert!(store.is_empty());
    assert!(!store.contains(ghost));
    assert_eq!(store.get(ghost), Err(ServerError::UnknownPlayer(ghost)));
    assert_eq!(
        store.increment_wins(ghost),
        Err(ServerError::UnknownPlayer(ghost))
    );
}

#[test]
fn test_increment_wins_counts_up() {
    let store = PlayerStore::new();
    let bob = store.register("Bob");
    assert_eq!(store.increment_wins(bob.id).unwrap(), 1);
    assert_eq!(store.increment_wins(bob.id).unwrap(), 2);
    assert_eq!(store.get(bob.id).unwrap().wins, 2);
}

#[test]
fn test_leaderboard_skips_winless_and_sorts_descending() {
    let store = PlayerStore::new();
    let alice = store.register("Alice");
    let _bob = store.register("Bob");
    let carol = store.register("Carol");
    let dave = store.register("Dave");

    assert!(store.leaderboard().is_empty());

    store.increment_wins(alice.id).unwrap();
    for _ in 0..3 {
        store.increment_wins(carol.id).unwrap();
    }
    store.increment_wins(dave.id).unwrap();

    let entry = |name: &str, wins| LeaderboardEntry {
        name: name.to_string(),
        wins,
    };
    assert_eq!(
        store.leaderboard(),
        vec![entry("Carol", 3), entry("Alice", 1), entry("Dave", 1)]
    );
}

#[test]
fn test_concurrent_increments_are_not_lost() {
    let store = std::sync::Arc::new(PlayerStore::new());
    let player = store.register("Eve");
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            std::thread::spawn(move || {
                for _ in 0..100 {
                    store.increment_wins(player.id).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(store.get(player.id).unwrap().wins, 800);
}
