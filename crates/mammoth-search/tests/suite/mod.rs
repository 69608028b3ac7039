mod properties;
mod range_search;
