use crate::hub::BroadcastHub;

pub(crate) struct RelayState {
    pub(crate) hub: BroadcastHub,
}
