pub mod errors;
pub mod db;
pub mod user;
pub mod user_credentials;
pub mod user_rating;
pub mod service_type;
pub mod order;

#[cfg(test)]
mod tests;
