
use kw_core::prelude::*;
use kw_testutils::*;
use rstest::*;
use tracing_test::traced_test;

use super::config::*;
use super::*;
