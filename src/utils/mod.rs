pub mod time;

const ID_LEN: usize = 21;

/// Generate a collision-resistant id for runs and telemetry correlation.
pub fn longid() -> String {
    nanoid::nanoid!(ID_LEN)
}
