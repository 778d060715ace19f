pub mod coin;
pub mod coin_type;
pub mod mint;
pub mod user;
pub mod user_collection;

pub use coin::CoinDto;
pub use user::UserSummary;
pub use user_collection::CollectionItemDto;
