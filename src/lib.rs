//! # Crunchy (Recipe Sharing Backend)
//!
//! `crunchy` is the backend for a social recipe-sharing app: accounts with
//! email OTP verification, optional two-factor login and security-question
//! recovery, a recipe catalog with questions/reviews, and a news feed.
//!
//! ## Verification Model
//!
//! Every user document embeds one OTP slot per purpose (`confirm-account`,
//! `password-reset`, `2fa-toggle`, `login-2fa`, `security-recovery`). Codes
//! are six digits, single use, and expire lazily at verification time.
//! Issuing a new code overwrites the previous one for that purpose only.
//!
//! ## Sessions
//!
//! Sessions are stateless signed tokens carried in the `token` cookie (or a
//! bearer header) with a fixed 7-day validity. Logout clears the cookie;
//! there is no server-side revocation.
//!
//! ## Storage
//!
//! Postgres, one JSONB document per user/recipe/post. Every mutation is a
//! single-document read-modify-write; concurrent writers race
//! last-write-wins.

pub mod api;
pub mod cli;
pub mod otp;
pub mod password;
pub mod security;
pub mod session;
pub mod store;
