mod access;
mod lifecycle;
mod races;
mod sharing;
