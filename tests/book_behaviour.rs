//! Behavioural tests for the hash order book.
//!
//! A small book (ten slots, three collision tiers) is driven with random
//! workloads and compared against a `BTreeMap` model: lookups, erases,
//! ordered traversal, and rehashing must all agree.

use std::collections::BTreeMap;

use hash_orderbook::orderbook::Tier;
use hash_orderbook::{BookConfig, HashOrderBook, Side};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ============================================================================
// HELPERS
// ============================================================================

const REFERENCE: i64 = 110;
const BEST_BID: i64 = 109;
const BEST_OFFER: i64 = 111;

type Model = BTreeMap<(Side, i64), u64>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Book with the BBO pinned next to the reference, so random depth behind
/// it never moves the mid out of the inline tier.
fn anchored_book() -> (HashOrderBook<i64, u64>, Model) {
    init_tracing();
    let mut book = HashOrderBook::new(BookConfig::new(1, 10, 3), REFERENCE).unwrap();
    let mut model = Model::new();
    for (side, price) in [(Side::Bid, BEST_BID), (Side::Ask, BEST_OFFER)] {
        assert!(book.insert(side, price, 1));
        model.insert((side, price), 1);
    }
    (book, model)
}

/// Bids in `[40, 108]`, asks in `[112, 180]`: every tier from inline to
/// overflow is reached on both sides.
fn random_entry(rng: &mut ChaCha8Rng) -> (Side, i64) {
    if rng.gen_bool(0.5) {
        (Side::Bid, rng.gen_range(40..BEST_BID))
    } else {
        (Side::Ask, rng.gen_range(BEST_OFFER + 1..=180))
    }
}

/// Empty book for one-sided workloads. With a single side cached the mid
/// follows that side, so crossed prices can be inserted freely.
fn bare_book() -> HashOrderBook<i64, u64> {
    init_tracing();
    HashOrderBook::new(BookConfig::new(1, 10, 3), REFERENCE).unwrap()
}

/// Asks in `[60, 180]` cross below the window, fill the layers and reach deep
/// overflow. Bids in `[40, 125]` do the same mirrored; 95 is left out since
/// it shares its node with 115 at the top of the window.
fn one_sided_price(rng: &mut ChaCha8Rng, side: Side) -> i64 {
    match side {
        Side::Ask => rng.gen_range(60..=180),
        Side::Bid => loop {
            let price = rng.gen_range(40..=125);
            if price != 95 {
                break price;
            }
        },
    }
}

fn walk(book: &HashOrderBook<i64, u64>, side: Side) -> Vec<(i64, u64)> {
    book.levels(side)
        .filter_map(|node| node.entry(side))
        .map(|(price, qty)| (*price, *qty))
        .collect()
}

fn model_walk(model: &Model, side: Side) -> Vec<(i64, u64)> {
    let entries = model
        .iter()
        .filter(|((s, _), _)| *s == side)
        .map(|((_, price), qty)| (*price, *qty));
    match side {
        Side::Bid => entries.rev().collect(),
        Side::Ask => entries.collect(),
    }
}

fn assert_matches_model(book: &HashOrderBook<i64, u64>, model: &Model) {
    assert_eq!(book.len(), model.len());
    for (&(side, price), qty) in model {
        assert_eq!(book.find(side, price), Some(qty), "{side} {price}");
    }
    assert_eq!(walk(book, Side::Bid), model_walk(model, Side::Bid));
    assert_eq!(walk(book, Side::Ask), model_walk(model, Side::Ask));
}

// ============================================================================
// MODEL COMPARISON
// ============================================================================

#[test]
fn test_random_workload_matches_btreemap() {
    let (mut book, mut model) = anchored_book();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    for step in 0..20_000 {
        let (side, price) = random_entry(&mut rng);
        match rng.gen_range(0..3) {
            0 | 1 => {
                let qty = rng.gen_range(1..1_000);
                let expected = !model.contains_key(&(side, price));
                if expected {
                    model.insert((side, price), qty);
                }
                assert_eq!(book.insert(side, price, qty), expected, "step {step}");
            }
            _ => {
                assert_eq!(
                    book.erase(side, price),
                    model.remove(&(side, price)).is_some(),
                    "step {step}"
                );
            }
        }
        assert_eq!(book.find(side, price), model.get(&(side, price)));
        assert_eq!(book.len(), model.len());
    }

    assert_matches_model(&book, &model);
    assert_eq!(book.get_best_bid(), Some((BEST_BID, &1)));
    assert_eq!(book.get_best_offer(), Some((BEST_OFFER, &1)));
}

#[test]
fn test_every_inserted_price_found() {
    let (mut book, mut model) = anchored_book();

    for price in 40..BEST_BID {
        assert!(book.insert(Side::Bid, price, price as u64));
        model.insert((Side::Bid, price), price as u64);
    }
    for price in BEST_OFFER + 1..=180 {
        assert!(book.insert(Side::Ask, price, price as u64));
        model.insert((Side::Ask, price), price as u64);
    }

    assert_matches_model(&book, &model);

    let overflow: usize = book.slots().iter().map(|s| s.overflow().len()).sum();
    assert!(overflow > 0);
    assert!(matches!(book.locate(Side::Ask, 180).tier, Tier::Overflow(_)));
    assert!(matches!(book.locate(Side::Bid, 40).tier, Tier::Overflow(_)));
}

#[test]
fn test_quantity_updates_through_cursor() {
    let (mut book, mut model) = anchored_book();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    for _ in 0..200 {
        let (side, price) = random_entry(&mut rng);
        if book.insert(side, price, 1) {
            model.insert((side, price), 1);
        }
    }

    let mut cursor = book.cursor(Side::Ask);
    while !cursor.is_end() {
        if let Some(qty) = cursor
            .node_mut(&mut book)
            .and_then(|node| node.value_mut(Side::Ask))
        {
            *qty += 1;
        }
        cursor.advance(&book);
    }
    for ((side, _), qty) in model.iter_mut() {
        if *side == Side::Ask {
            *qty += 1;
        }
    }

    assert_matches_model(&book, &model);
}

#[test]
fn test_one_sided_walks_match_btreemap() {
    for side in [Side::Bid, Side::Ask] {
        let mut book = bare_book();
        let mut model = Model::new();
        let mut rng = ChaCha8Rng::seed_from_u64(21);

        for step in 0..5_000 {
            let price = one_sided_price(&mut rng, side);
            if rng.gen_bool(0.6) {
                let expected = !model.contains_key(&(side, price));
                if expected {
                    model.insert((side, price), step);
                }
                assert_eq!(book.insert(side, price, step), expected, "{side} {price}");
            } else {
                assert_eq!(book.erase(side, price), model.remove(&(side, price)).is_some());
            }
            if step % 250 == 0 {
                assert_matches_model(&book, &model);
            }
        }

        assert_matches_model(&book, &model);
    }
}

#[test]
fn test_crossed_best_leads_the_walk() {
    let mut book = bare_book();
    let mut model = Model::new();
    // Ask 100 sits below the window and 105 at its bottom edge. Bid 115 is
    // the top of the window, 121 is above it and 70 in deep overflow.
    for (side, price) in [
        (Side::Ask, 111),
        (Side::Ask, 105),
        (Side::Ask, 100),
        (Side::Ask, 140),
    ] {
        assert!(book.insert(side, price, 1));
        model.insert((side, price), 1);
    }
    assert_matches_model(&book, &model);

    let mut bids = bare_book();
    let mut bid_model = Model::new();
    for price in [109, 115, 121, 70] {
        assert!(bids.insert(Side::Bid, price, 2));
        bid_model.insert((Side::Bid, price), 2);
    }
    assert_matches_model(&bids, &bid_model);
}

// ============================================================================
// REHASH
// ============================================================================

#[test]
fn test_rehash_is_transparent() {
    let (mut book, mut model) = anchored_book();
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    for _ in 0..500 {
        let (side, price) = random_entry(&mut rng);
        if book.insert(side, price, rng.gen_range(1..100)) {
            model.insert((side, price), *book.find(side, price).unwrap());
        }
    }
    let best_bid = book.get_best_bid().map(|(p, q)| (p, *q));
    let best_offer = book.get_best_offer().map(|(p, q)| (p, *q));

    for reference in [112, 108, 110] {
        book.rehash(reference);

        assert_eq!(book.reference_mid(), reference);
        assert_matches_model(&book, &model);
        assert_eq!(book.get_best_bid().map(|(p, q)| (p, *q)), best_bid);
        assert_eq!(book.get_best_offer().map(|(p, q)| (p, *q)), best_offer);
    }
}

#[test]
fn test_rehash_to_distant_reference() {
    let (mut book, mut model) = anchored_book();
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    for _ in 0..300 {
        let (side, price) = random_entry(&mut rng);
        if book.insert(side, price, 5) {
            model.insert((side, price), 5);
        }
    }

    // Every entry lands in overflow and the old mid is far outside the
    // new fast book
    book.rehash(400);
    assert_matches_model(&book, &model);

    book.rehash(REFERENCE);
    assert_matches_model(&book, &model);
    assert_eq!(book.mid_index(), 5);
}

#[test]
fn test_one_sided_rehash_round_trip() {
    let mut book = bare_book();
    let mut model = Model::new();
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    for _ in 0..200 {
        let price = one_sided_price(&mut rng, Side::Ask);
        if book.insert(Side::Ask, price, 1) {
            model.insert((Side::Ask, price), 1);
        }
    }

    for reference in [300, 60, 140, REFERENCE] {
        book.rehash(reference);
        assert_matches_model(&book, &model);
    }
}

#[test]
fn test_operations_after_rehash() {
    let (mut book, mut model) = anchored_book();
    book.rehash(112);

    // 113 now sits inline
    assert_eq!(book.locate(Side::Ask, 113).tier, Tier::Inline);
    assert!(book.insert(Side::Ask, 113, 4));
    model.insert((Side::Ask, 113), 4);
    assert!(book.erase(Side::Bid, BEST_BID));
    model.remove(&(Side::Bid, BEST_BID));

    assert_matches_model(&book, &model);
}

// ============================================================================
// CLEAR
// ============================================================================

#[test]
fn test_clear_then_reuse() {
    let (mut book, _) = anchored_book();
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    for _ in 0..300 {
        let (side, price) = random_entry(&mut rng);
        book.insert(side, price, 1);
    }

    book.clear_with_mid(1_000);
    assert!(book.is_empty());
    assert!(book.cursor(Side::Bid).is_end());
    assert!(book.cursor(Side::Ask).is_end());

    assert!(book.insert(Side::Bid, 999, 2));
    assert!(book.insert(Side::Ask, 1_001, 3));
    assert_eq!(book.get_best_bid(), Some((999, &2)));
    assert_eq!(book.get_best_offer(), Some((1_001, &3)));
    assert_eq!(book.mid_index(), 5);
}
