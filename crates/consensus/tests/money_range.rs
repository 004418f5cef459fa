use grsd_consensus::money::{is_money_range, sum_money, Amount, MoneyError, SUPPLY_CEILING};

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn next_amount(&mut self) -> Amount {
        self.next_u64() as Amount
    }

    fn gen_range(&mut self, max: u64) -> u64 {
        if max == 0 {
            0
        } else {
            self.next_u64() % max
        }
    }
}

fn expected(value: Amount) -> bool {
    (0..=SUPPLY_CEILING).contains(&value)
}

#[test]
fn closed_interval_over_random_amounts() {
    let mut rng = Lcg::new(0x6d6f_6e65_7972_616e);
    for _ in 0..200_000 {
        let value = rng.next_amount();
        assert_eq!(is_money_range(value), expected(value), "value {value}");
    }
}

#[test]
fn closed_interval_inside_the_range() {
    let mut rng = Lcg::new(7);
    for _ in 0..200_000 {
        let value = rng.gen_range(SUPPLY_CEILING as u64 + 1) as Amount;
        assert!(is_money_range(value), "value {value}");
    }
}

#[test]
fn boundary_neighbourhoods() {
    let anchors = [Amount::MIN, -SUPPLY_CEILING, 0, SUPPLY_CEILING, Amount::MAX];
    for anchor in anchors {
        for offset in -1_000i64..=1_000 {
            let Some(value) = anchor.checked_add(offset) else {
                continue;
            };
            assert_eq!(is_money_range(value), expected(value), "value {value}");
        }
    }
}

#[test]
fn ceiling_leaves_room_for_large_sums() {
    // Summing thousands of maximal outputs must not wrap an i64.
    let headroom = Amount::MAX / SUPPLY_CEILING;
    assert!(headroom >= 800, "headroom {headroom}");
    assert!(SUPPLY_CEILING.checked_mul(headroom).is_some());
    assert!(SUPPLY_CEILING.checked_neg().is_some());
}

#[test]
fn random_output_sets_sum_within_ceiling() {
    let mut rng = Lcg::new(42);
    for _ in 0..1_000 {
        let count = rng.gen_range(2_000) as usize;
        let cap = (SUPPLY_CEILING as u64) / 4_000;
        let values: Vec<Amount> = (0..count)
            .map(|_| rng.gen_range(cap + 1) as Amount)
            .collect();
        let expected: Amount = values.iter().sum();
        assert_eq!(sum_money(values), Ok(expected));
    }
}

#[test]
fn output_sets_over_ceiling_are_rejected() {
    let mut rng = Lcg::new(99);
    for _ in 0..1_000 {
        let count = 2 + rng.gen_range(64) as usize;
        let values: Vec<Amount> = (0..count)
            .map(|_| SUPPLY_CEILING / 2 + 1 + rng.gen_range(1_000) as Amount)
            .collect();
        assert_eq!(sum_money(values), Err(MoneyError::OutOfRange));
    }
}
