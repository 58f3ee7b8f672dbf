pub mod confirmation;
pub mod db;
pub mod mailer;
