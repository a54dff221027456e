use mockall::mock;

use robsim_core::common::{RegId, SchedulerError};
use robsim_core::core::deps::RegisterDependencies;
use robsim_core::core::memory::{MemoryAccess, MemoryRequest, MemoryResult};
use robsim_core::core::uop::DynamicMicroOp;

mock! {
    pub Memory {}

    impl MemoryAccess for Memory {
        fn access(&mut self, request: &MemoryRequest) -> MemoryResult;
    }
}

mock! {
    pub RegisterDeps {}

    impl RegisterDependencies for RegisterDeps {
        fn peek_producer(&self, reg: RegId, lowest: u64) -> Option<u64>;
        fn set_dependencies(&mut self, uop: &mut DynamicMicroOp, lowest: u64) -> Result<(), SchedulerError>;
    }
}
