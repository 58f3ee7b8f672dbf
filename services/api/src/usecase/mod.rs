pub mod comment;
pub mod review;
pub mod signup;
pub mod term;
pub mod title;
pub mod token;
pub mod user;
