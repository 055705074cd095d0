mod filters;
mod flags;
mod object_walk;
mod path_filter;
mod uninteresting;
