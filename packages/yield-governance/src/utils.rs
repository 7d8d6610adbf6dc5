/// Seconds in one week. Locks, snapshots and reward streams are bucketed by this length.
pub const EPOCH_LENGTH: u64 = 7 * 86400;

/// Calculates the epoch id containing the given timestamp.
#[inline]
pub fn get_epoch(time: u64) -> u64 {
    time / EPOCH_LENGTH
}

/// Returns the timestamp at which the epoch containing `time` started.
#[inline]
pub fn get_epoch_start(time: u64) -> u64 {
    get_epoch(time) * EPOCH_LENGTH
}

/// Returns the timestamp of the next epoch boundary strictly after `time`.
#[inline]
pub fn get_next_epoch_start(time: u64) -> u64 {
    get_epoch_start(time) + EPOCH_LENGTH
}

/// Converts an epoch id into the timestamp it starts at.
#[inline]
pub fn epoch_to_timestamp(epoch: u64) -> u64 {
    epoch * EPOCH_LENGTH
}
