// Check, mount and umount over a selection of devices
pub mod run;

// Read-only views of the device graph
pub mod graph;
