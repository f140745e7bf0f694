use common::PositionSide;

/// The single position held by the simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Position {
    Flat,
    Long { entry_price: f64, size: f64 },
    Short { entry_price: f64, size: f64 },
}

impl Position {
    pub fn open(side: PositionSide, entry_price: f64, size: f64) -> Self {
        match side {
            PositionSide::Long => Position::Long { entry_price, size },
            PositionSide::Short => Position::Short { entry_price, size },
        }
    }

    pub fn side(&self) -> Option<PositionSide> {
        match self {
            Position::Flat => None,
            Position::Long { .. } => Some(PositionSide::Long),
            Position::Short { .. } => Some(PositionSide::Short),
        }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, Position::Flat)
    }

    /// `(entry_price, size)` of an open position.
    pub fn entry(&self) -> Option<(f64, f64)> {
        match *self {
            Position::Flat => None,
            Position::Long { entry_price, size } | Position::Short { entry_price, size } => {
                Some((entry_price, size))
            }
        }
    }

    /// Realized profit of closing this position at `exit_price`.
    pub fn profit_at(&self, exit_price: f64) -> f64 {
        match *self {
            Position::Flat => 0.0,
            Position::Long { entry_price, size } => (exit_price - entry_price) * size,
            Position::Short { entry_price, size } => (entry_price - exit_price) * size,
        }
    }
}

/// Free capital. While a position is open, the capital backing it is held by
/// the position (and by `margin` under margin accounting), not by `balance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Account {
    pub balance: f64,
    /// Capital locked by the open position; only used by margin accounting.
    pub margin: f64,
}

impl Account {
    pub fn new(balance: f64) -> Self {
        Self { balance, margin: 0.0 }
    }
}
