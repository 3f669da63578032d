//! The standard read/update/insert/scan/delete mix
//!
//! Load phase: [`do_insert`](Workload::do_insert) writes one full row per
//! call, keys drawn in ordered or shuffled order from `[0, record_count)`.
//!
//! Run phase: [`do_transaction`](Workload::do_transaction) picks an operation
//! by weighted proportion. Reads, updates, scans and deletes target a key
//! chosen uniformly from the loaded range. Inserts draw fresh keys from
//! `[record_count, record_count + operation_count)` and acknowledge each key
//! once the backend reports success.
//!
//! Recoverable backend failures are ignored here; the timing decorator has
//! already recorded them.

use rand::distributions::{Alphanumeric, Distribution, WeightedIndex};
use rand::Rng;
use strata_bench_core::{Backend, Error, Field, Generator, Result, Workload};
use strata_bench_generator::{
    CounterGenerator, RandomAcknowledgedCounterGenerator, RandomCounterGenerator,
};
use tracing::trace;

use crate::options::{InsertOrder, WorkloadOptions};

/// Build the row key for record number `n`
///
/// Zero padded so lexical order matches numeric order.
pub fn build_key(n: u64) -> String {
    format!("user{:012}", n)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxnOp {
    Read,
    Update,
    Insert,
    Scan,
    Delete,
}

/// Configurable operation mix over one table
pub struct CoreWorkload {
    options: WorkloadOptions,
    field_names: Vec<String>,
    ops: Vec<TxnOp>,
    chooser: WeightedIndex<f64>,
    load_keys: Box<dyn Generator<u64>>,
    insert_keys: RandomAcknowledgedCounterGenerator,
}

impl CoreWorkload {
    /// Validate `options` and prepare the key generators
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the options fail validation.
    pub fn new(options: WorkloadOptions) -> Result<Self> {
        options.validate()?;

        let mix = [
            (TxnOp::Read, options.read_proportion),
            (TxnOp::Update, options.update_proportion),
            (TxnOp::Insert, options.insert_proportion),
            (TxnOp::Scan, options.scan_proportion),
            (TxnOp::Delete, options.delete_proportion),
        ];
        let (ops, weights): (Vec<_>, Vec<_>) = mix.into_iter().filter(|(_, w)| *w > 0.0).unzip();
        let chooser = WeightedIndex::new(&weights)
            .map_err(|e| Error::config(format!("operation proportions: {}", e)))?;

        let load_keys: Box<dyn Generator<u64>> = match options.insert_order {
            InsertOrder::Ordered => Box::new(CounterGenerator::new(0)),
            InsertOrder::Random => Box::new(RandomCounterGenerator::new(0, options.record_count)),
        };
        let insert_keys =
            RandomAcknowledgedCounterGenerator::new(options.record_count, options.operation_count);

        let field_names = (0..options.field_count)
            .map(|i| format!("field{}", i))
            .collect();

        Ok(Self {
            options,
            field_names,
            ops,
            chooser,
            load_keys,
            insert_keys,
        })
    }

    /// Options this workload was built from
    pub fn options(&self) -> &WorkloadOptions {
        &self.options
    }

    /// Keys inserted during the run phase and acknowledged by the backend
    pub fn insert_keys(&self) -> &RandomAcknowledgedCounterGenerator {
        &self.insert_keys
    }

    fn random_value<R: Rng>(&self, rng: &mut R) -> Vec<u8> {
        rng.sample_iter(&Alphanumeric)
            .take(self.options.field_length)
            .collect()
    }

    fn full_row<R: Rng>(&self, rng: &mut R) -> Vec<Field> {
        self.field_names
            .iter()
            .map(|name| Field::new(name.clone(), self.random_value(rng)))
            .collect()
    }

    fn update_row<R: Rng>(&self, rng: &mut R) -> Vec<Field> {
        if self.options.write_all_fields {
            self.full_row(rng)
        } else {
            let name = self.random_field(rng);
            vec![Field::new(name, self.random_value(rng))]
        }
    }

    fn random_field<R: Rng>(&self, rng: &mut R) -> String {
        self.field_names[rng.gen_range(0..self.field_names.len())].clone()
    }

    fn read_fields<R: Rng>(&self, rng: &mut R) -> Option<Vec<String>> {
        if self.options.read_all_fields {
            None
        } else {
            Some(vec![self.random_field(rng)])
        }
    }

    fn existing_key<R: Rng>(&self, rng: &mut R) -> String {
        build_key(rng.gen_range(0..self.options.record_count))
    }
}

impl std::fmt::Debug for CoreWorkload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreWorkload")
            .field("options", &self.options)
            .field("ops", &self.ops)
            .finish_non_exhaustive()
    }
}

impl Workload for CoreWorkload {
    fn do_insert(&self, db: &dyn Backend) -> Result<()> {
        let mut rng = rand::thread_rng();
        let key = build_key(self.load_keys.next());
        let row = self.full_row(&mut rng);
        db.insert(&self.options.table, &key, &row)?;
        Ok(())
    }

    fn do_transaction(&self, db: &dyn Backend, in_warmup: bool) -> Result<()> {
        let mut rng = rand::thread_rng();
        let op = self.ops[self.chooser.sample(&mut rng)];
        trace!(?op, in_warmup, "transaction");

        let table = &self.options.table;
        match op {
            TxnOp::Read => {
                let key = self.existing_key(&mut rng);
                let fields = self.read_fields(&mut rng);
                let mut result = Vec::new();
                db.read(table, &key, fields.as_deref(), &mut result)?;
            }
            TxnOp::Update => {
                let key = self.existing_key(&mut rng);
                let values = self.update_row(&mut rng);
                db.update(table, &key, &values)?;
            }
            TxnOp::Insert => {
                let n = self.insert_keys.next();
                let row = self.full_row(&mut rng);
                if db.insert(table, &build_key(n), &row)?.is_ok() {
                    self.insert_keys.acknowledge(n);
                }
            }
            TxnOp::Scan => {
                let key = self.existing_key(&mut rng);
                let len = rng.gen_range(1..=self.options.max_scan_length);
                let fields = self.read_fields(&mut rng);
                let mut result = Vec::new();
                db.scan(table, &key, len, fields.as_deref(), &mut result)?;
            }
            TxnOp::Delete => {
                let key = self.existing_key(&mut rng);
                db.delete(table, &key)?;
            }
        }
        Ok(())
    }
}
