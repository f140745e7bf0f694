use common::PositionSide;

/// Trade narration emitted by the simulation as it happens.
#[derive(Debug, Clone, PartialEq)]
pub enum TradeEvent {
    Enter {
        index: usize,
        side: PositionSide,
        price: f64,
        size: f64,
        /// Free balance after the entry.
        balance: f64,
    },
    Exit {
        index: usize,
        side: PositionSide,
        price: f64,
        profit: f64,
        /// Free balance after the exit.
        balance: f64,
        /// Closed by the end of the series rather than by a crossover.
        forced: bool,
    },
}

impl TradeEvent {
    pub fn balance(&self) -> f64 {
        match self {
            TradeEvent::Enter { balance, .. } | TradeEvent::Exit { balance, .. } => *balance,
        }
    }
}

impl std::fmt::Display for TradeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeEvent::Enter { side: PositionSide::Long, price, .. } => write!(f, "BUY at {price}"),
            TradeEvent::Enter { side: PositionSide::Short, price, .. } => {
                write!(f, "SHORT at {price}")
            }
            TradeEvent::Exit { side: PositionSide::Long, price, profit, forced, .. } => {
                let verb = if *forced { "SELL LONG" } else { "SELL" };
                write!(f, "{verb} at {price}, Profit: {profit:.2}")
            }
            TradeEvent::Exit { side: PositionSide::Short, price, profit, .. } => {
                write!(f, "CLOSE SHORT at {price}, Profit: {profit:.2}")
            }
        }
    }
}
