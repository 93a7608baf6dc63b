mod money;
mod seating;

pub use money::{MachineId, MachineRegistry, MoneyGrabber, MoneyHolder, Wallet, WalletError};
pub use seating::{SeatCandidate, SeatFinder, SeatId};
