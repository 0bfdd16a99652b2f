mod concurrency;
mod isolation;
mod round_trip;
mod swapping;
