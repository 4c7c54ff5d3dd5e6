//! In-session scoring

/// Score tracking for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Score {
    /// Current score
    pub points: u64,
    /// Current level
    pub level: u32,
    /// Total rows cleared
    pub lines: u32,
}

impl Default for Score {
    fn default() -> Self {
        Self::new()
    }
}

impl Score {
    pub fn new() -> Self {
        Self {
            points: 0,
            level: 1,
            lines: 0,
        }
    }

    /// Add the rows cleared by one placement
    /// Returns the points awarded
    pub fn add_clear(&mut self, rows: u32) -> u64 {
        let base: u64 = match rows {
            0 => return 0,
            1 => 100,
            2 => 300,
            3 => 500,
            _ => 800,
        };

        let awarded = base * self.level as u64;
        self.points += awarded;
        self.lines += rows;
        // Level up every 10 rows
        self.level = (self.lines / 10) + 1;
        awarded
    }

    /// One point per row moved by a player soft drop
    pub fn add_soft_drop(&mut self, rows: u32) {
        self.points += rows as u64;
    }
}
