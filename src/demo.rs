//! Sample fixtures for the `rigor` binary.
//!
//! `demo` passes cleanly; `showcase` exercises every outcome the harness can report (assertion failures, execution
//! errors, skipped fixtures, missing constructors, inherited lifecycle methods).

use std::hint::black_box;

use rigor::describe::Module;
use rigor::loader::Registry;
use rigor::{TestResult, check, kinds};

pub fn registry() -> Registry {
    Registry::new()
        .module("demo", || {
            Module::builder("demo").register::<Calc>().register::<Other>().build()
        })
        .module("showcase", || {
            Module::builder("showcase")
                .register::<Broken>()
                .register::<Database>()
                .register::<Unbuildable>()
                .register::<Ledger>()
                .build()
        })
}

// ============================================================================
// demo
// ============================================================================

#[derive(Default)]
pub struct Calc {
    memory: i64,
}

impl Calc {
    fn div(&self, a: i64, b: i64) -> i64 {
        a / b
    }
}

#[rigor::fixture]
impl Calc {
    #[setup]
    fn clear(&mut self) {
        self.memory = 0;
    }

    #[test_case]
    fn add_ok(&mut self) -> TestResult {
        check::equal(4, 2 + 2)
    }

    #[test_case]
    #[expected_error(kinds::ZERO_DIVISION_ERROR)]
    fn div_zero(&mut self) {
        self.memory = self.div(1, black_box(0));
    }

    #[test_case]
    #[expected_error(kinds::VALUE_ERROR, message = "invalid digit")]
    fn parse_rejects_garbage(&mut self) -> TestResult {
        self.memory = "4x".parse::<i64>()?;
        Ok(())
    }

    #[test_case]
    fn memory_starts_clear(&mut self) -> TestResult {
        check::equal(0, self.memory)
    }
}

#[derive(Default)]
pub struct Other;

#[rigor::fixture]
impl Other {
    #[test_case]
    fn greets() -> TestResult {
        check::equal("hello, rigor", format!("hello, {}", "rigor").as_str())
    }
}

// ============================================================================
// showcase
// ============================================================================

#[derive(Default)]
pub struct Broken {
    items: Vec<u8>,
}

#[rigor::fixture]
impl Broken {
    #[test_case]
    fn always_false(&mut self) -> TestResult {
        check::is_true(self.items.len() > 1)
    }

    #[test_case]
    fn out_of_bounds(&mut self) -> TestResult {
        let index = black_box(3);
        check::equal(0, self.items[index])
    }

    #[test_case]
    #[expected_error(kinds::KEY_ERROR)]
    fn raises_the_wrong_kind(&mut self) {
        check::raise(&kinds::VALUE_ERROR, "not a key problem");
    }
}

/// One-time setup fails, so every case is skipped.
#[derive(Default)]
pub struct Database;

#[rigor::fixture]
impl Database {
    #[one_time_setup]
    fn connect() -> TestResult {
        Err(rigor::Failure::new(&kinds::IO_ERROR, "connection refused"))
    }

    #[test_case]
    fn query(&mut self) -> TestResult {
        Ok(())
    }

    #[test_case]
    fn insert(&mut self) -> TestResult {
        Ok(())
    }

    #[one_time_teardown]
    fn disconnect() {}
}

pub struct Unbuildable;

fn refuse() -> Unbuildable {
    check::raise(&kinds::NOT_SUPPORTED_ERROR, "Unbuildable needs a live service")
}

#[rigor::fixture(constructor = refuse)]
impl Unbuildable {
    #[test_case]
    fn never_runs(&mut self) -> TestResult {
        check::fail("constructed anyway")
    }
}

/// Shared setup reached through [`Ledger`]'s base link.
#[derive(Default)]
pub struct Accounts {
    balance: i64,
}

#[rigor::fixture(support)]
impl Accounts {
    #[setup]
    fn open(&mut self) {
        self.balance = 100;
    }
}

#[derive(Default)]
pub struct Ledger {
    accounts: Accounts,
}

impl AsMut<Accounts> for Ledger {
    fn as_mut(&mut self) -> &mut Accounts {
        &mut self.accounts
    }
}

#[rigor::fixture(base = Accounts)]
impl Ledger {
    #[test_case]
    fn opening_balance(&mut self) -> TestResult {
        check::equal(100, self.accounts.balance)
    }

    #[test_case]
    fn withdraw(&mut self) -> TestResult {
        self.accounts.balance -= 30;
        check::equal(70, self.accounts.balance)
    }
}
