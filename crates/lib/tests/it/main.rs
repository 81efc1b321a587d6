/*! Integration tests for Flashdeck.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - user: Tests for the user directory (registration, lookup, profile edits)
 * - deck: Tests for the deck store (access, sharing, likes, lifecycle, Uncategorized deck)
 * - card: Tests for the card store (routing, moves, deletion, orphans)
 * - library: Tests for the service layer (identifier resolution, projections, user deletion)
 * - backend: Tests for the backend implementations and persistence
 *
 * `interleaved` wraps the backend under test so a competing write can land
 * between a store's access check and its own write.
 *
 * Every test runs against the backend selected by TEST_BACKEND, see `helpers::test_backend`.
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("flashdeck=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod deck;
mod helpers;
