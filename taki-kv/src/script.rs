/// Server-side scripts guarding the `claimed` field of a task hash. Each one
/// reads and conditionally writes the field in a single round trip so that
/// concurrent schedulers cannot race on the claim state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClaimScript {
    /// Sets `claimed` only if the task exists and the field is absent.
    Acquire,
    /// Removes `claimed` only if it is present.
    Release,
    /// Deletes the whole task hash only if `claimed` is present.
    DeleteClaimed,
}

impl ClaimScript {
    pub fn source(&self) -> &'static str {
        match self {
            ClaimScript::Acquire => {
                r#"
if redis.call("exists", KEYS[1]) == 1 and redis.call("hexists", KEYS[1], "claimed") == 0 then
    return redis.call("hset", KEYS[1], "claimed", "1")
else
    return 0
end"#
            }
            ClaimScript::Release => {
                r#"
if redis.call("hget", KEYS[1], "claimed") == "1" then
    return redis.call("hdel", KEYS[1], "claimed")
else
    return 0
end"#
            }
            ClaimScript::DeleteClaimed => {
                r#"
if redis.call("hget", KEYS[1], "claimed") == "1" then
    return redis.call("del", KEYS[1])
else
    return 0
end"#
            }
        }
    }
}
