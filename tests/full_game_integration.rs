//! End-to-end integration tests driving the engine actor.
//!
//! Everything goes through `EngineHandle`, the same surface a chat
//! transport would use.

use std::sync::Arc;

use cah_engine::catalog::{CardCatalog, MemoryCatalog};
use cah_engine::engine::{EngineActor, EngineHandle};
use cah_engine::game::{GameConfig, GameEvent, Outgoing, Phase};
use cah_engine::scores::{MemoryLedger, ScoreLedger};
use cah_engine::{Card, HAND_SIZE, Username};

fn seeded_catalog() -> Arc<MemoryCatalog> {
    let mut cards = Vec::new();
    for i in 0..12 {
        cards.push(Card::prompt(i + 1, &format!("Prompt {i} needs __________.")));
    }
    for i in 0..60 {
        cards.push(Card::response(100 + i, &format!("Response {i}")));
    }
    Arc::new(MemoryCatalog::new(cards))
}

fn config(seed: u64) -> GameConfig {
    GameConfig {
        rng_seed: Some(seed),
        ..GameConfig::default()
    }
}

async fn started_engine(seed: u64) -> (EngineHandle, Arc<MemoryCatalog>, Arc<MemoryLedger>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let catalog = seeded_catalog();
    let ledger = Arc::new(MemoryLedger::new());
    let (actor, handle) = EngineActor::new(config(seed), catalog.clone(), ledger.clone())
        .await
        .expect("catalog should load");
    tokio::spawn(actor.run());
    (handle, catalog, ledger)
}

async fn dealer_of(handle: &EngineHandle, names: &[&str]) -> Username {
    for name in names {
        let status = handle.status((*name).into()).await.unwrap();
        if status.snapshot.is_dealer {
            return (*name).into();
        }
    }
    panic!("no dealer among {names:?}");
}

async fn play_one_round(handle: &EngineHandle, names: &[&str]) -> Username {
    let dealer = dealer_of(handle, names).await;
    for name in names {
        let name: Username = (*name).into();
        if name == dealer {
            continue;
        }
        if !handle.status(name.clone()).await.unwrap().snapshot.playing {
            continue;
        }
        handle.play(name, vec![1]).await.unwrap().result.unwrap();
    }
    handle
        .choose_winner(dealer.clone(), 1)
        .await
        .unwrap()
        .result
        .unwrap();
    dealer
}

#[tokio::test]
async fn rounds_rotate_and_scores_accumulate() {
    let (handle, _catalog, _ledger) = started_engine(1).await;
    let names = ["alice", "bob", "carol"];
    for name in names {
        handle.join(name.into()).await.unwrap().result.unwrap();
    }

    let mut dealers = Vec::new();
    for _ in 0..5 {
        dealers.push(play_one_round(&handle, &names).await);
    }
    // Round-robin: every player dealt at least once over five rounds.
    for name in names {
        assert!(dealers.contains(&name.into()), "{name} never dealt");
    }

    let mut total = 0;
    for name in names {
        total += handle.status(name.into()).await.unwrap().score;
    }
    assert_eq!(total, 5, "exactly one win per round");

    let reply = handle.top_scores().await.unwrap();
    let Some(Outgoing::Broadcast(GameEvent::TopScores { entries })) = reply.outgoing.first()
    else {
        panic!("expected a leaderboard broadcast");
    };
    assert_eq!(entries.len(), 3);
    assert!(entries.windows(2).all(|w| w[0].1 >= w[1].1));
}

#[tokio::test]
async fn late_joiner_waits_for_the_next_round() {
    let (handle, _catalog, _ledger) = started_engine(2).await;
    let names = ["alice", "bob", "carol"];
    for name in names {
        handle.join(name.into()).await.unwrap().result.unwrap();
    }

    let reply = handle.join("dave".into()).await.unwrap();
    reply.result.unwrap();
    assert!(reply.outgoing.contains(&Outgoing::Broadcast(GameEvent::Queued {
        name: "dave".into(),
    })));
    let status = handle.status("dave".into()).await.unwrap();
    assert!(!status.snapshot.playing);
    let roster = handle.list_players().await.unwrap();
    assert_eq!(roster.players.len(), 3);
    assert_eq!(roster.queued, vec![Username::from("dave")]);

    play_one_round(&handle, &names).await;

    let status = handle.status("dave".into()).await.unwrap();
    assert!(status.snapshot.playing);
    assert_eq!(status.snapshot.hand.len(), HAND_SIZE);
}

#[tokio::test]
async fn kicked_players_are_gone_for_good() {
    let (handle, _catalog, _ledger) = started_engine(3).await;
    for name in ["alice", "bob", "carol"] {
        handle.join(name.into()).await.unwrap().result.unwrap();
    }

    // Two eligible voters; the first vote alone is not enough.
    let reply = handle
        .vote_kick("alice".into(), "carol".into())
        .await
        .unwrap();
    reply.result.unwrap();
    assert!(reply.outgoing.is_empty());

    let reply = handle
        .vote_kick("bob".into(), "carol".into())
        .await
        .unwrap();
    reply.result.unwrap();
    assert!(reply.outgoing.contains(&Outgoing::Broadcast(GameEvent::Kicked {
        name: "carol".into(),
    })));
    assert!(reply.outgoing.contains(&Outgoing::Broadcast(
        GameEvent::NotEnoughPlayers
    )));

    let status = handle.status("carol".into()).await.unwrap();
    assert!(!status.snapshot.playing);
    assert!(status.snapshot.hand.is_empty());
}

#[tokio::test]
async fn authored_cards_reach_the_catalog() {
    let (handle, catalog, _ledger) = started_engine(4).await;
    let before = catalog.load_initial_cards().await.unwrap().len();

    let reply = handle
        .add_card(
            "alice".into(),
            "Something nobody expected".into(),
            "white".into(),
        )
        .await
        .unwrap();
    reply.result.unwrap();

    let cards = catalog.load_initial_cards().await.unwrap();
    assert_eq!(cards.len(), before + 1);
    let card = cards.last().unwrap();
    assert!(!card.official);
    assert_eq!(card.text, "Something nobody expected");
}

#[tokio::test]
async fn leaderboard_shows_at_most_five_entries() {
    let (handle, _catalog, ledger) = started_engine(5).await;
    let names = [
        "player0", "player1", "player2", "player3", "player4", "player5", "player6",
    ];
    for name in names {
        handle.join(name.into()).await.unwrap().result.unwrap();
    }
    // The first round admits the four queued players at its reset.
    play_one_round(&handle, &names[..3]).await;
    let roster = handle.list_players().await.unwrap().players;
    assert_eq!(roster.len(), 7);

    for name in &roster {
        ledger.record_win(name, &roster).await.unwrap();
    }
    let reply = handle.top_scores().await.unwrap();
    let Some(Outgoing::Broadcast(GameEvent::TopScores { entries })) = reply.outgoing.first()
    else {
        panic!("expected a leaderboard broadcast");
    };
    assert_eq!(entries.len(), 5);
}

#[tokio::test]
async fn leaderboard_drops_departed_winners() {
    let (handle, _catalog, _ledger) = started_engine(8).await;
    let names = ["alice", "bob", "carol", "dave"];
    for name in names {
        handle.join(name.into()).await.unwrap().result.unwrap();
    }
    play_one_round(&handle, &names[..3]).await;

    // Whoever holds the round's point walks out.
    let mut winner = None;
    for name in names {
        if handle.status(name.into()).await.unwrap().score > 0 {
            winner = Some(Username::from(name));
        }
    }
    let winner = winner.expect("someone won the round");
    handle.leave(winner.clone()).await.unwrap().result.unwrap();

    let reply = handle.top_scores().await.unwrap();
    let Some(Outgoing::Broadcast(GameEvent::TopScores { entries })) = reply.outgoing.first()
    else {
        panic!("expected a leaderboard broadcast");
    };
    assert!(entries.iter().all(|(name, _)| *name != winner));
    assert!(entries.iter().all(|(_, score)| *score == 0));
}

#[tokio::test]
async fn departures_below_minimum_pause_the_game() {
    let (handle, _catalog, _ledger) = started_engine(6).await;
    let names = ["alice", "bob", "carol"];
    for name in names {
        handle.join(name.into()).await.unwrap().result.unwrap();
    }

    let reply = handle.leave("bob".into()).await.unwrap();
    reply.result.unwrap();
    assert!(reply.outgoing.contains(&Outgoing::Broadcast(
        GameEvent::NotEnoughPlayers
    )));

    // A replacement restarts the game immediately.
    let reply = handle.join("dave".into()).await.unwrap();
    reply.result.unwrap();
    assert!(reply.outgoing.contains(&Outgoing::Broadcast(GameEvent::ReadyToStart {
        name: "dave".into(),
    })));
    let dealer = dealer_of(&handle, &["alice", "carol", "dave"]).await;
    assert_ne!(dealer, "bob".into());
}

#[tokio::test]
async fn event_text_reads_like_a_chat_room() {
    let (handle, _catalog, _ledger) = started_engine(7).await;
    let reply = handle.join("alice".into()).await.unwrap();
    reply.result.unwrap();
    let rendered: Vec<String> = reply
        .outgoing
        .iter()
        .map(|o| match o {
            Outgoing::Broadcast(event) | Outgoing::Notify(_, event) => event.to_string(),
        })
        .collect();
    assert!(rendered.iter().any(|s| s.contains("alice has joined the game")));
    assert!(rendered.iter().any(|s| s.contains("Current players: alice")));
    assert_eq!(Phase::Join.to_string(), "join");
}
