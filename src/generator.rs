use rand::Rng;

use crate::types::{TransactionInput, TransactionType, ALL_TYPES};

/// Synthetic mobile-money transactions shaped like the data the model was fit on.
pub struct TransactionGenerator {
    pub fraud_rate: f64,
    step: i64,
    generated: u64,
}

impl TransactionGenerator {
    pub fn new(fraud_rate: f64) -> Self {
        Self {
            fraud_rate,
            step: 1,
            generated: 0,
        }
    }

    pub fn generate(&mut self) -> TransactionInput {
        let mut rng = rand::thread_rng();
        if rng.gen_bool(self.fraud_rate.clamp(0.0, 1.0)) {
            self.generate_fraud()
        } else {
            self.generate_normal()
        }
    }

    pub fn generate_batch(&mut self, n: usize) -> Vec<TransactionInput> {
        (0..n).map(|_| self.generate()).collect()
    }

    pub fn generate_normal(&mut self) -> TransactionInput {
        let mut rng = rand::thread_rng();
        let kind = ALL_TYPES[rng.gen_range(0..ALL_TYPES.len())];
        let amount = round_cents(rng.gen_range(10.0..20_000.0));

        let old_balance_origin = round_cents(amount + rng.gen_range(0.0..50_000.0));
        let new_balance_origin = match kind {
            TransactionType::CashIn => round_cents(old_balance_origin + amount),
            _ => round_cents(old_balance_origin - amount),
        };

        let (destination_account, old_balance_destination, new_balance_destination) = match kind {
            // merchants carry no balance
            TransactionType::Payment => (merchant_id(&mut rng), 0.0, 0.0),
            TransactionType::CashIn => {
                let old = round_cents(rng.gen_range(amount..amount + 100_000.0));
                (customer_id(&mut rng), old, round_cents(old - amount))
            }
            _ => {
                let old = round_cents(rng.gen_range(0.0..100_000.0));
                (customer_id(&mut rng), old, round_cents(old + amount))
            }
        };

        self.next(TransactionInput {
            step: self.step,
            kind,
            amount,
            origin_account: customer_id(&mut rng),
            old_balance_origin,
            new_balance_origin,
            destination_account,
            old_balance_destination,
            new_balance_destination,
            is_flagged_fraud: false,
        })
    }

    /// Account takeover: the whole origin balance leaves through a transfer or
    /// cash-out and never shows up on the destination side.
    pub fn generate_fraud(&mut self) -> TransactionInput {
        let mut rng = rand::thread_rng();
        let kind = if rng.gen_bool(0.5) {
            TransactionType::Transfer
        } else {
            TransactionType::CashOut
        };
        let amount = round_cents(rng.gen_range(100.0..1_000_000.0));

        self.next(TransactionInput {
            step: self.step,
            kind,
            amount,
            origin_account: customer_id(&mut rng),
            old_balance_origin: amount,
            new_balance_origin: 0.0,
            destination_account: customer_id(&mut rng),
            old_balance_destination: 0.0,
            new_balance_destination: 0.0,
            is_flagged_fraud: kind == TransactionType::Transfer && amount > 200_000.0,
        })
    }

    /// One simulated hour per hundred transactions.
    fn next(&mut self, tx: TransactionInput) -> TransactionInput {
        self.generated += 1;
        if self.generated % 100 == 0 {
            self.step += 1;
        }
        tx
    }
}

fn customer_id<R: Rng>(rng: &mut R) -> String {
    format!("C{}", rng.gen_range(100_000_000u64..2_000_000_000))
}

fn merchant_id<R: Rng>(rng: &mut R) -> String {
    format!("M{}", rng.gen_range(100_000_000u64..2_000_000_000))
}

fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_transactions_pass_validation() {
        let mut gen = TransactionGenerator::new(0.3);
        for tx in gen.generate_batch(500) {
            tx.validate().unwrap();
        }
    }

    #[test]
    fn fraud_drains_origin_without_crediting_destination() {
        let mut gen = TransactionGenerator::new(1.0);
        let tx = gen.generate();
        assert!(matches!(tx.kind, TransactionType::Transfer | TransactionType::CashOut));
        assert_eq!(tx.old_balance_origin, tx.amount);
        assert_eq!(tx.new_balance_origin, 0.0);
        assert_eq!(tx.new_balance_destination, 0.0);
    }

    #[test]
    fn step_advances() {
        let mut gen = TransactionGenerator::new(0.0);
        let batch = gen.generate_batch(250);
        assert_eq!(batch[0].step, 1);
        assert_eq!(batch[249].step, 3);
    }
}
