mod builder_synthesis;
mod generation;
mod registry;
mod support;
