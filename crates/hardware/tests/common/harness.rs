use sisd_core::common::SimResult;
use sisd_core::config::Config;
use sisd_core::sim::CodeGenerator;
use sisd_core::{SisdCore, TickReport};

/// A core plus the tick loops tests need.
pub struct TestContext {
    pub core: SisdCore,
}

impl TestContext {
    /// The default machine with a fixed seed.
    pub fn config() -> Config {
        let mut config = Config::default();
        config.general.seed = 0x1234_5678;
        config
    }

    /// A core running the random workload of `config`.
    pub fn new(config: Config) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let core = SisdCore::new(config).expect("valid test configuration");
        Self { core }
    }

    /// A core running only the shapes pushed by `script`.
    pub fn scripted(config: Config, script: impl FnOnce(&mut CodeGenerator) -> SimResult<()>) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let mut generator = CodeGenerator::scripted(&config);
        script(&mut generator).expect("script fits the configuration");
        let core = SisdCore::with_generator(config, generator).expect("valid test configuration");
        Self { core }
    }

    /// Ticks `n` times, returning every report.
    pub fn run(&mut self, n: u64) -> Vec<TickReport> {
        (0..n).map(|_| self.core.tick().expect("tick")).collect()
    }

    /// Ticks until `done` holds or `limit` ticks elapsed; returns the ticks taken.
    pub fn run_until(&mut self, limit: u64, done: impl Fn(&SisdCore) -> bool) -> u64 {
        for ticks in 0..limit {
            if done(&self.core) {
                return ticks;
            }
            let _ = self.core.tick().expect("tick");
        }
        panic!("condition not reached within {limit} ticks");
    }

    /// Ticks until every unit is empty and the fetcher has nothing left to fetch.
    pub fn drain(&mut self, limit: u64) -> u64 {
        self.run_until(limit, |core| {
            core.alu().current().is_none()
                && core.io().current().is_none()
                && core.decoder().current().is_none()
                && core.fetcher().latch().is_none()
                && core.generator().is_empty()
                && core.fetcher().pc() >= core.buffer().highest_instruction_address()
        })
    }
}
