mod condition;
mod execute;

pub(crate) use crate::test_fixtures::*;
