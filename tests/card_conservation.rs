//! Card conservation property tests.
//!
//! Whatever sequence of commands a room throws at the session, every card
//! ever introduced must stay accounted for: in a deck pool, in a hand, in
//! a submission, or on the table as the current prompt. Nothing leaks and
//! nothing is duplicated, including across rejected commands and forced
//! round abandonments.

use cah_engine::game::{GameConfig, Phase, Session};
use cah_engine::{Card, CardColor, Username};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Join(u8),
    Leave(u8),
    Play(u8, Vec<usize>),
    ChooseWinner(u8, usize),
    VoteKick(u8, u8),
    AddCard(bool),
    Poke(u8, u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..6).prop_map(Op::Join),
        (0u8..6).prop_map(Op::Leave),
        ((0u8..6), prop::collection::vec(1usize..=9, 1..=2))
            .prop_map(|(p, indices)| Op::Play(p, indices)),
        ((0u8..6), 1usize..=6).prop_map(|(p, answer)| Op::ChooseWinner(p, answer)),
        ((0u8..6), (0u8..6)).prop_map(|(voter, target)| Op::VoteKick(voter, target)),
        any::<bool>().prop_map(Op::AddCard),
        ((0u8..6), (0u8..6)).prop_map(|(poker, target)| Op::Poke(poker, target)),
    ]
}

fn name(i: u8) -> Username {
    format!("player{i}").into()
}

fn catalog() -> Vec<Card> {
    let mut cards = Vec::new();
    for i in 0..12 {
        cards.push(Card::prompt(i + 1, &format!("Prompt {i} wants __________.")));
    }
    for i in 0..60 {
        cards.push(Card::response(100 + i, &format!("Response {i}")));
    }
    cards
}

proptest! {
    #[test]
    fn cards_are_conserved_under_any_command_sequence(
        seed in any::<u64>(),
        ops in prop::collection::vec(op_strategy(), 1..200),
    ) {
        let mut session = Session::new(
            GameConfig {
                rng_seed: Some(seed),
                ..GameConfig::default()
            },
            catalog(),
        );

        for op in ops {
            // Rejections are expected constantly here; only the invariants
            // after each command matter.
            let _ = match op {
                Op::Join(p) => session.join(&name(p)).map(|_| ()),
                Op::Leave(p) => session.leave(&name(p)).map(|_| ()),
                Op::Play(p, indices) => session.play(&name(p), &indices).map(|_| ()),
                Op::ChooseWinner(p, answer) => {
                    session.choose_winner(&name(p), answer).map(|_| ())
                }
                Op::VoteKick(voter, target) => {
                    session.vote_kick(&name(voter), &name(target)).map(|_| ())
                }
                Op::AddCard(prompt) => {
                    let (text, color) = if prompt {
                        ("Tell me about _", "black")
                    } else {
                        ("A perfectly ordinary thing", "white")
                    };
                    session.add_card(text, color).map(|_| ())
                }
                Op::Poke(poker, target) => {
                    session.poke(&name(poker), &name(target)).map(|_| ())
                }
            };

            for color in [CardColor::Prompt, CardColor::Response] {
                prop_assert_eq!(
                    session.card_census(color),
                    session.cards_introduced(color),
                    "census mismatch for {} cards after {:?}",
                    color,
                    session.phase()
                );
            }
            // A round exists exactly when the session is not gathering
            // players.
            prop_assert_eq!(session.round().is_some(), session.phase() != Phase::Join);
        }
    }

    #[test]
    fn hands_never_exceed_the_deal_size(
        seed in any::<u64>(),
        ops in prop::collection::vec(op_strategy(), 1..100),
    ) {
        let mut session = Session::new(
            GameConfig {
                rng_seed: Some(seed),
                ..GameConfig::default()
            },
            catalog(),
        );

        for op in ops {
            let _ = match op {
                Op::Join(p) => session.join(&name(p)).map(|_| ()),
                Op::Leave(p) => session.leave(&name(p)).map(|_| ()),
                Op::Play(p, indices) => session.play(&name(p), &indices).map(|_| ()),
                Op::ChooseWinner(p, answer) => {
                    session.choose_winner(&name(p), answer).map(|_| ())
                }
                Op::VoteKick(voter, target) => {
                    session.vote_kick(&name(voter), &name(target)).map(|_| ())
                }
                Op::AddCard(_) => Ok(()),
                Op::Poke(poker, target) => {
                    session.poke(&name(poker), &name(target)).map(|_| ())
                }
            };

            for player in session.roster() {
                let hand = session.hand_of(&player).map_or(0, <[Card]>::len);
                prop_assert!(hand <= cah_engine::HAND_SIZE);
            }
        }
    }
}
