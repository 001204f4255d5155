use battleship_server::{
    halo, random_fleet, AttackStatus, FinishedGame, GameCreated, GamePhase, LeaderboardEntry,
    Lobby, Orientation, Outcome, PlacementError, PlacementPolicy, PlayerId, Position,
    ServerError, ShipKind, ShipPlacement, ShipsSubmitted, SERVE_PLACEMENT,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;

struct Table {
    lobby: Lobby,
    alice: PlayerId,
    bob: PlayerId,
    created: GameCreated,
}

fn seat_two(policy: PlacementPolicy) -> Table {
    let lobby = Lobby::new(policy);
    let alice = lobby.register("Alice").player.id;
    let bob = lobby.register("Bob").player.id;
    let room = lobby.rooms().create_or_join_room(alice)[0].id;
    assert!(lobby.rooms().join_room(room, bob).unwrap().is_applied());
    let created = lobby.games().create_game(room, bob).unwrap();
    Table {
        lobby,
        alice,
        bob,
        created,
    }
}

fn ship(x: u8, y: u8, orientation: Orientation, kind: ShipKind) -> ShipPlacement {
    ShipPlacement::new(x, y, orientation, kind)
}

/// Alice holds a medium ship at (0,0); Bob's fleet is `bob_fleet`.
fn started(bob_fleet: &[ShipPlacement]) -> Table {
    let table = seat_two(PlacementPolicy::Permissive);
    let games = table.lobby.games();
    let game = table.created.game_id;
    let alice_fleet = [ship(0, 0, Orientation::Horizontal, ShipKind::Medium)];
    games.submit_ships(game, table.alice, &alice_fleet).unwrap();
    let start = games.submit_ships(game, table.bob, bob_fleet).unwrap();
    assert!(start.applied().unwrap().is_game_start());
    table
}

#[test]
fn test_alice_sinks_bob_end_to_end() {
    let table = seat_two(PlacementPolicy::Permissive);
    let lobby = &table.lobby;
    let game = table.created.game_id;

    assert_eq!(table.created.player_ids, [table.alice, table.bob]);
    assert!(table.created.rooms.is_empty());
    assert!(lobby.rooms().rooms().is_empty());
    assert_eq!(lobby.games().snapshot(game).unwrap().phase(), GamePhase::Forming);

    let waiting = lobby
        .games()
        .submit_ships(game, table.alice, &[ship(0, 0, Orientation::Horizontal, ShipKind::Medium)])
        .unwrap();
    assert_eq!(waiting, Outcome::Applied(ShipsSubmitted::Waiting));
    assert_eq!(lobby.games().snapshot(game).unwrap().phase(), GamePhase::Placement);

    let start = match lobby
        .games()
        .submit_ships(game, table.bob, &[ship(5, 5, Orientation::Horizontal, ShipKind::Small)])
        .unwrap()
    {
        Outcome::Applied(ShipsSubmitted::Started(start)) => start,
        other => panic!("game did not start: {:?}", other),
    };
    assert_eq!(start.turn.current_player, table.alice);
    assert_eq!(start.player_ids, [table.alice, table.bob]);
    assert_eq!(start.fleets[1].ships[0].cells.len(), 1);
    assert_eq!(lobby.games().snapshot(game).unwrap().phase(), GamePhase::Active);

    let report = lobby
        .games()
        .attack(game, 5, 5, table.alice)
        .unwrap()
        .applied()
        .unwrap();
    assert_eq!(report.attack_result.status, AttackStatus::Killed);
    assert_eq!(report.attack_result.current_player, table.alice);
    assert!(report.is_finished);
    assert_eq!(report.halo_misses.len(), 8);
    assert!(report
        .halo_misses
        .iter()
        .all(|m| m.status == AttackStatus::Miss && m.current_player == table.alice));

    assert_eq!(lobby.players().get(table.alice).unwrap().wins, 1);
    assert_eq!(
        lobby.players().leaderboard(),
        vec![LeaderboardEntry {
            name: "Alice".to_string(),
            wins: 1
        }]
    );
    assert_eq!(
        lobby.games().finished(game),
        Some(FinishedGame {
            game_id: game,
            player_ids: [table.alice, table.bob],
            winner: table.alice,
        })
    );
    assert!(!lobby.games().contains(game));
}

#[test]
fn test_miss_passes_turn() {
    let table = started(&[ship(5, 5, Orientation::Horizontal, ShipKind::Small)]);
    let game = table.created.game_id;
    let report = table
        .lobby
        .games()
        .attack(game, 0, 0, table.alice)
        .unwrap()
        .applied()
        .unwrap();
    assert_eq!(report.attack_result.status, AttackStatus::Miss);
    assert_eq!(report.turn.current_player, table.bob);
    assert!(!report.is_finished);
    assert!(report.halo_misses.is_empty());
}

#[test]
fn test_hit_keeps_turn() {
    let table = started(&[ship(5, 5, Orientation::Horizontal, ShipKind::Large)]);
    let game = table.created.game_id;
    let report = table
        .lobby
        .games()
        .attack(game, 6, 5, table.alice)
        .unwrap()
        .applied()
        .unwrap();
    assert_eq!(report.attack_result.status, AttackStatus::Shot);
    assert_eq!(report.turn.current_player, table.alice);
}

#[test]
fn test_out_of_turn_attack_is_ignored() {
    let table = started(&[ship(5, 5, Orientation::Horizontal, ShipKind::Small)]);
    let games = table.lobby.games();
    let game = table.created.game_id;

    assert_eq!(games.attack(game, 0, 0, table.bob), Ok(Outcome::Rejected));
    let snapshot = games.snapshot(game).unwrap();
    assert_eq!(snapshot.turn(), Some(table.alice));
    assert_eq!(snapshot.shots(table.bob).unwrap().shot_count(), 0);
}

#[test]
fn test_repeated_target_is_ignored() {
    let table = started(&[ship(5, 5, Orientation::Horizontal, ShipKind::Small)]);
    let games = table.lobby.games();
    let game = table.created.game_id;

    assert!(games.attack(game, 0, 0, table.alice).unwrap().is_applied());
    assert!(games.attack(game, 9, 9, table.bob).unwrap().is_applied());
    let before = games.snapshot(game).unwrap().shots(table.alice).unwrap();

    assert_eq!(games.attack(game, 0, 0, table.alice), Ok(Outcome::Rejected));
    let snapshot = games.snapshot(game).unwrap();
    assert_eq!(snapshot.turn(), Some(table.alice));
    assert_eq!(snapshot.shots(table.alice).unwrap(), before);
}

#[test]
fn test_off_board_attack_is_ignored() {
    let table = started(&[ship(5, 5, Orientation::Horizontal, ShipKind::Small)]);
    let games = table.lobby.games();
    let game = table.created.game_id;
    assert_eq!(games.attack(game, 10, 0, table.alice), Ok(Outcome::Rejected));
    assert_eq!(games.attack(game, 3, 200, table.alice), Ok(Outcome::Rejected));
    assert_eq!(games.snapshot(game).unwrap().turn(), Some(table.alice));
}

#[test]
fn test_kill_marks_halo_as_misses() {
    let table = started(&[
        ship(5, 5, Orientation::Horizontal, ShipKind::Medium),
        ship(0, 9, Orientation::Horizontal, ShipKind::Small),
    ]);
    let games = table.lobby.games();
    let game = table.created.game_id;

    let first = games.attack(game, 5, 5, table.alice).unwrap().applied().unwrap();
    assert_eq!(first.attack_result.status, AttackStatus::Shot);

    let kill = games.attack(game, 6, 5, table.alice).unwrap().applied().unwrap();
    assert_eq!(kill.attack_result.status, AttackStatus::Killed);
    assert!(!kill.is_finished);
    assert_eq!(kill.turn.current_player, table.alice);

    let expected = halo([Position::new(5, 5), Position::new(6, 5)]);
    let reported: Vec<Position> = kill.halo_misses.iter().map(|m| m.position).collect();
    assert_eq!(reported, expected);
    assert_eq!(reported.len(), 10);

    let shots = games.snapshot(game).unwrap().shots(table.alice).unwrap();
    assert_eq!(shots.shot_count(), 12);
    for pos in &expected {
        assert!(shots.is_shot(*pos).unwrap());
    }
    assert!(!shots.is_shot(Position::new(3, 5)).unwrap());

    assert_eq!(games.attack(game, 4, 5, table.alice), Ok(Outcome::Rejected));
}

#[test]
fn test_attack_before_start_is_ignored() {
    let table = seat_two(PlacementPolicy::Permissive);
    let games = table.lobby.games();
    let game = table.created.game_id;
    assert_eq!(games.attack(game, 0, 0, table.alice), Ok(Outcome::Rejected));

    games
        .submit_ships(game, table.alice, &[ship(0, 0, Orientation::Vertical, ShipKind::Small)])
        .unwrap();
    assert_eq!(games.attack(game, 0, 0, table.alice), Ok(Outcome::Rejected));
}

#[test]
fn test_first_submitter_moves_first() {
    let table = seat_two(PlacementPolicy::Permissive);
    let games = table.lobby.games();
    let game = table.created.game_id;
    let fleet = [ship(3, 3, Orientation::Vertical, ShipKind::Small)];

    games.submit_ships(game, table.bob, &fleet).unwrap();
    let start = games
        .submit_ships(game, table.alice, &fleet)
        .unwrap()
        .applied()
        .unwrap();
    match start {
        ShipsSubmitted::Started(start) => {
            assert_eq!(start.turn.current_player, table.bob);
            assert_eq!(start.player_ids, [table.bob, table.alice]);
        }
        ShipsSubmitted::Waiting => panic!("second submission must start the game"),
    }
}

#[test]
fn test_resubmission_replaces_fleet_until_start() {
    let table = seat_two(PlacementPolicy::Permissive);
    let games = table.lobby.games();
    let game = table.created.game_id;

    games
        .submit_ships(game, table.alice, &[ship(0, 0, Orientation::Vertical, ShipKind::Small)])
        .unwrap();
    let again = games
        .submit_ships(game, table.alice, &[ship(9, 9, Orientation::Vertical, ShipKind::Small)])
        .unwrap();
    assert_eq!(again, Outcome::Applied(ShipsSubmitted::Waiting));

    let snapshot = games.snapshot(game).unwrap();
    let fleet = snapshot.fleet(table.alice).unwrap().unwrap();
    assert!(fleet[0].occupies(Position::new(9, 9)));

    games
        .submit_ships(game, table.bob, &[ship(4, 4, Orientation::Vertical, ShipKind::Small)])
        .unwrap();
    let late = games
        .submit_ships(game, table.bob, &[ship(1, 1, Orientation::Vertical, ShipKind::Small)])
        .unwrap();
    assert_eq!(late, Outcome::Rejected);
}

#[test]
fn test_attack_after_finish_is_ignored() {
    let table = started(&[ship(5, 5, Orientation::Horizontal, ShipKind::Small)]);
    let games = table.lobby.games();
    let game = table.created.game_id;

    assert!(games.attack(game, 5, 5, table.alice).unwrap().applied().unwrap().is_finished);
    assert_eq!(games.attack(game, 7, 7, table.alice), Ok(Outcome::Rejected));
    assert_eq!(games.attack(game, 0, 0, table.bob), Ok(Outcome::Rejected));
    assert_eq!(table.lobby.players().get(table.alice).unwrap().wins, 1);
}

#[test]
fn test_won_game_is_retired() {
    let table = started(&[ship(5, 5, Orientation::Horizontal, ShipKind::Small)]);
    let lobby = &table.lobby;
    let games = lobby.games();
    let game = table.created.game_id;
    assert_eq!(games.live_count(), 1);

    games.attack(game, 5, 5, table.alice).unwrap();
    assert_eq!(games.live_count(), 0);
    assert_eq!(games.snapshot(game).map(|g| g.id()), Err(ServerError::UnknownGame(game)));
    assert_eq!(
        games.pick_random_untargeted_cell(game, table.bob, &mut SmallRng::seed_from_u64(1)),
        Ok(None)
    );
    let fleet = [ship(1, 1, Orientation::Vertical, ShipKind::Small)];
    assert_eq!(games.submit_ships(game, table.bob, &fleet), Ok(Outcome::Rejected));

    let carol = lobby.register("Carol").player.id;
    assert_eq!(
        games.attack(game, 1, 1, carol),
        Err(ServerError::NotInGame {
            game,
            player: carol
        })
    );
}

#[test]
fn test_precondition_errors() {
    let table = seat_two(PlacementPolicy::Permissive);
    let lobby = &table.lobby;
    let game = table.created.game_id;
    let carol = lobby.register("Carol").player.id;
    let fleet = [ship(0, 0, Orientation::Vertical, ShipKind::Small)];

    assert_eq!(
        lobby.games().attack(game, 0, 0, carol),
        Err(ServerError::NotInGame {
            game,
            player: carol
        })
    );
    assert_eq!(
        lobby.games().submit_ships(game, carol, &fleet),
        Err(ServerError::NotInGame {
            game,
            player: carol
        })
    );

    let ghost = battleship_server::GameId::new();
    assert_eq!(
        lobby.games().attack(ghost, 0, 0, table.alice),
        Err(ServerError::UnknownGame(ghost))
    );
    assert!(!lobby.games().contains(ghost));
    assert!(lobby.games().contains(game));

    let room = lobby.rooms().create_or_join_room(carol)[0].id;
    assert_eq!(
        lobby.games().create_game(room, carol).map(|c| c.game_id),
        Err(ServerError::RoomNotReady { room, occupants: 1 })
    );
    assert_eq!(lobby.rooms().rooms().len(), 1);
}

#[test]
fn test_strict_policy_rejects_bad_fleet() {
    let table = seat_two(PlacementPolicy::Strict);
    let games = table.lobby.games();
    let game = table.created.game_id;
    assert_eq!(games.placement_policy(), PlacementPolicy::Strict);

    let off_board = [ship(9, 0, Orientation::Horizontal, ShipKind::Medium)];
    assert_eq!(
        games.submit_ships(game, table.alice, &off_board),
        Err(ServerError::InvalidPlacement(PlacementError::OutOfBounds {
            index: 0
        }))
    );
    assert_eq!(games.snapshot(game).unwrap().phase(), GamePhase::Forming);
}

#[test]
fn test_unknown_game_is_reported_before_placement() {
    let table = seat_two(PlacementPolicy::Strict);
    let ghost = battleship_server::GameId::new();
    let off_board = [ship(9, 0, Orientation::Horizontal, ShipKind::Medium)];
    assert_eq!(
        table.lobby.games().submit_ships(ghost, table.alice, &off_board),
        Err(ServerError::UnknownGame(ghost))
    );
}

#[test]
fn test_random_attacks_play_a_full_game() {
    let table = seat_two(PlacementPolicy::Classic);
    let games = table.lobby.games();
    let game = table.created.game_id;
    let mut rng = SmallRng::seed_from_u64(7);

    games
        .submit_ships(game, table.alice, &random_fleet(&mut rng).unwrap())
        .unwrap();
    games
        .submit_ships(game, table.bob, &random_fleet(&mut rng).unwrap())
        .unwrap();

    let mut accepted = 0;
    let winner = loop {
        if let Some(done) = games.finished(game) {
            break done.winner;
        }
        let snapshot = games.snapshot(game).unwrap();
        let attacker = snapshot.turn().unwrap();
        let target = games
            .pick_random_untargeted_cell(game, attacker, &mut rng)
            .unwrap()
            .unwrap();
        assert!(!snapshot.shots(attacker).unwrap().is_shot(target).unwrap());
        let report = games
            .attack(game, target.x, target.y, attacker)
            .unwrap()
            .applied()
            .unwrap();
        assert_eq!(report.attack_result.position, target);
        accepted += 1;
        assert!(accepted <= 200, "game did not finish");
    };

    assert_eq!(table.lobby.players().get(winner).unwrap().wins, 1);
    let loser = if winner == table.alice { table.bob } else { table.alice };
    assert_eq!(table.lobby.players().get(loser).unwrap().wins, 0);
}

#[test]
fn test_serve_policy_refuses_touching_ships() {
    let table = seat_two(SERVE_PLACEMENT);
    let games = table.lobby.games();
    let game = table.created.game_id;
    let touching = [
        ship(5, 5, Orientation::Horizontal, ShipKind::Small),
        ship(6, 5, Orientation::Horizontal, ShipKind::Small),
    ];
    assert_eq!(
        games.submit_ships(game, table.bob, &touching),
        Err(ServerError::InvalidPlacement(PlacementError::Touching {
            first: 0,
            second: 1
        }))
    );
    let overlapping = [
        ship(5, 5, Orientation::Horizontal, ShipKind::Medium),
        ship(6, 5, Orientation::Vertical, ShipKind::Small),
    ];
    assert_eq!(
        games.submit_ships(game, table.bob, &overlapping),
        Err(ServerError::InvalidPlacement(PlacementError::Overlap {
            first: 0,
            second: 1
        }))
    );
}

#[test]
fn test_permissive_halo_covers_touching_neighbour() {
    let table = started(&[
        ship(5, 5, Orientation::Horizontal, ShipKind::Small),
        ship(6, 5, Orientation::Horizontal, ShipKind::Small),
    ]);
    let games = table.lobby.games();
    let game = table.created.game_id;

    let kill = games.attack(game, 5, 5, table.alice).unwrap().applied().unwrap();
    assert!(kill
        .halo_misses
        .iter()
        .any(|m| m.position == Position::new(6, 5)));
    assert_eq!(games.attack(game, 6, 5, table.alice), Ok(Outcome::Rejected));
    assert!(games.finished(game).is_none());
}
