mod eval;
mod path;
