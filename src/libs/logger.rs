use std::fmt;

/// Environment variable selecting the verbosity.
pub const LOG_LEVEL_ENV: &str = "PSMA_LOG_LEVEL";

/// How much a run reports. Each level includes the ones below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Phase and total timings
    Timings = 0,
    /// + every chunk the leader dispatches
    Dispatch = 1,
    /// + per-alignment timings and barrier waits
    Detail = 2,
}

impl Verbosity {
    /// Unset, unparsable or out-of-range values give [`Verbosity::Detail`].
    ///
    /// ```
    /// use psma::libs::logger::Verbosity;
    ///
    /// assert_eq!(Verbosity::parse(Some("0")), Verbosity::Timings);
    /// assert_eq!(Verbosity::parse(Some(" 1 ")), Verbosity::Dispatch);
    /// assert_eq!(Verbosity::parse(Some("7")), Verbosity::Detail);
    /// assert_eq!(Verbosity::parse(None), Verbosity::Detail);
    /// ```
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().parse::<i64>()) {
            Some(Ok(0)) => Verbosity::Timings,
            Some(Ok(1)) => Verbosity::Dispatch,
            _ => Verbosity::Detail,
        }
    }
}

/// Logger of one rank. Messages go through the `log` facade with the rank
/// prepended; the verbosity decides what is emitted at all.
#[derive(Debug, Clone, Copy)]
pub struct RankLogger {
    verbosity: Verbosity,
    rank: usize,
    is_leader: bool,
}

impl RankLogger {
    pub fn new(verbosity: Verbosity, rank: usize, is_leader: bool) -> Self {
        Self {
            verbosity,
            rank,
            is_leader,
        }
    }

    /// Verbosity from `PSMA_LOG_LEVEL`
    pub fn from_env(rank: usize, is_leader: bool) -> Self {
        let value = std::env::var(LOG_LEVEL_ENV).ok();
        Self::new(Verbosity::parse(value.as_deref()), rank, is_leader)
    }

    pub fn enabled(&self, level: Verbosity, leader_only: bool) -> bool {
        level <= self.verbosity && (!leader_only || self.is_leader)
    }

    pub fn log(&self, level: Verbosity, leader_only: bool, args: fmt::Arguments) {
        if self.enabled(level, leader_only) {
            log::info!("[rank {}] {}", self.rank, args);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(Verbosity::parse(Some("2")), Verbosity::Detail);
        assert_eq!(Verbosity::parse(Some("-1")), Verbosity::Detail);
        assert_eq!(Verbosity::parse(Some("verbose")), Verbosity::Detail);
        assert_eq!(Verbosity::parse(Some("")), Verbosity::Detail);
    }

    #[test]
    fn test_enabled() {
        let peer = RankLogger::new(Verbosity::Dispatch, 3, false);
        assert!(peer.enabled(Verbosity::Timings, false));
        assert!(peer.enabled(Verbosity::Dispatch, false));
        assert!(!peer.enabled(Verbosity::Detail, false));
        assert!(!peer.enabled(Verbosity::Timings, true));

        let leader = RankLogger::new(Verbosity::Timings, 0, true);
        assert!(leader.enabled(Verbosity::Timings, true));
        assert!(!leader.enabled(Verbosity::Dispatch, true));
    }
}
