mod parse;
mod tests;
