// Resume matcher: ranks uploaded resumes against a job description.
// All similarity calls go through `similarity`; no direct HTTP calls here.

pub mod extract;
pub mod handlers;
pub mod models;
pub mod normalize;
pub mod service;
