//! Static catalog of bridge commands.
//!
//! Evaluated once at startup by [`default_registry`]. Each descriptor names
//! a remote command exactly as the bridge dispatches it; the parameter
//! contract is what the dispatcher validates and coerces against.

use ceagent_domain::{
    DomainError, ParamType, ParameterSpec, TimeoutClass, ToolCategory, ToolDescriptor,
    ToolRegistry,
};

use ParamType::{Boolean, Integer, List};
use ParamType::String as Text;

/// Short names planners tend to use, mapped to canonical commands.
pub const TOOL_ALIASES: &[(&str, &str)] = &[
    ("scan", "scan_all"),
    ("read", "read_memory"),
    ("disasm", "disassemble"),
    ("aob", "aob_scan"),
    ("modules", "enum_modules"),
];

fn req(name: &str, param_type: ParamType, description: &str) -> ParameterSpec {
    ParameterSpec::required(name, param_type).describe(description)
}

fn opt(
    name: &str,
    param_type: ParamType,
    default: impl Into<serde_json::Value>,
    description: &str,
) -> ParameterSpec {
    ParameterSpec::with_default(name, param_type, default).describe(description)
}

fn address(description: &str) -> ParameterSpec {
    req("address", Integer, description)
}

fn tool(name: &str, category: ToolCategory, description: &str) -> ToolDescriptor {
    ToolDescriptor::new(name, category).describe(description)
}

pub fn basic_tools() -> Vec<ToolDescriptor> {
    vec![
        tool("ping", ToolCategory::Basic, "Check that the bridge is alive.")
            .with_timeout_class(TimeoutClass::Quick),
        tool(
            "evaluate_lua",
            ToolCategory::Basic,
            "Evaluate a Lua snippet inside Cheat Engine.",
        )
        .with_parameter(req("code", Text, "Lua source to evaluate")),
        tool(
            "auto_assemble",
            ToolCategory::Basic,
            "Run an Auto Assembler script.",
        )
        .with_parameter(req("script", Text, "Auto Assembler script text")),
    ]
}

pub fn process_tools() -> Vec<ToolDescriptor> {
    vec![
        tool(
            "get_process_info",
            ToolCategory::Process,
            "Describe the attached process.",
        )
        .with_timeout_class(TimeoutClass::Quick),
        tool(
            "get_symbol_address",
            ToolCategory::Process,
            "Resolve a symbol or module+offset expression to an address.",
        )
        .with_parameter(req("symbol", Text, "Symbol name, e.g. kernel32.CreateFileW"))
        .with_timeout_class(TimeoutClass::Quick),
        tool(
            "enum_modules",
            ToolCategory::Process,
            "List the modules loaded in the process.",
        )
        .with_timeout_class(TimeoutClass::Quick),
        tool(
            "get_thread_list",
            ToolCategory::Process,
            "List the process's threads.",
        )
        .with_timeout_class(TimeoutClass::Quick),
        tool(
            "get_address_info",
            ToolCategory::Process,
            "Describe which module, symbol and section an address belongs to.",
        )
        .with_parameter(address("Address to describe"))
        .with_parameter(opt("include_modules", Boolean, true, "Include module information"))
        .with_parameter(opt("include_symbols", Boolean, true, "Include the nearest symbol"))
        .with_parameter(opt("include_sections", Boolean, false, "Include PE section data"))
        .with_timeout_class(TimeoutClass::Quick),
    ]
}

pub fn memory_tools() -> Vec<ToolDescriptor> {
    vec![
        tool(
            "read_memory",
            ToolCategory::MemoryRead,
            "Read raw bytes from a specific memory address.",
        )
        .with_parameter(address("The memory address to read from"))
        .with_parameter(req("size", Integer, "The number of bytes to read")),
        tool(
            "read_integer",
            ToolCategory::MemoryRead,
            "Read an integer value from a specific memory address.",
        )
        .with_parameter(address("The memory address to read from"))
        .with_parameter(opt(
            "type",
            Text,
            "dword",
            "byte, word, dword, qword, float or double",
        )),
        tool(
            "read_string",
            ToolCategory::MemoryRead,
            "Read a string from a specific memory address.",
        )
        .with_parameter(address("The memory address to read from"))
        .with_parameter(opt("max_length", Integer, 256, "Maximum characters to read"))
        .with_parameter(opt("wide", Boolean, false, "Read UTF-16 instead of ASCII")),
        tool(
            "read_pointer",
            ToolCategory::MemoryRead,
            "Read a pointer value from a specific memory address.",
        )
        .with_parameter(address("The memory address to read from")),
        tool(
            "read_pointer_chain",
            ToolCategory::MemoryRead,
            "Read a value through a chain of pointers.",
        )
        .with_parameter(req("base", Integer, "Base address of the chain"))
        .with_parameter(req("offsets", List, "Offsets to follow, in order")),
        tool(
            "checksum_memory",
            ToolCategory::MemoryRead,
            "Calculate a checksum for a region of memory.",
        )
        .with_parameter(address("The starting memory address"))
        .with_parameter(req("size", Integer, "The size of the memory region")),
    ]
}

pub fn scan_tools() -> Vec<ToolDescriptor> {
    vec![
        tool(
            "scan_all",
            ToolCategory::PatternScan,
            "Scan all memory regions for a specific value.",
        )
        .with_parameter(req("value", Text, "The value to search for"))
        .with_parameter(opt("type", Text, "exact", "Scan type"))
        .with_parameter(opt("protection", Text, "+W-C", "Region protection filter"))
        .with_timeout_class(TimeoutClass::Scan),
        tool(
            "get_scan_results",
            ToolCategory::PatternScan,
            "Fetch addresses found by the last scan.",
        )
        .with_parameter(opt("max", Integer, 100, "Maximum results to return")),
        tool(
            "aob_scan",
            ToolCategory::PatternScan,
            "Scan for an array-of-bytes pattern with wildcards.",
        )
        .with_parameter(req("pattern", Text, "Byte pattern, e.g. \"48 8B ?? 10\""))
        .with_parameter(opt("protection", Text, "+X", "Region protection filter"))
        .with_parameter(opt("limit", Integer, 100, "Maximum matches"))
        .with_timeout_class(TimeoutClass::Scan),
        tool(
            "search_string",
            ToolCategory::PatternScan,
            "Search memory for a text string.",
        )
        .with_parameter(req("string", Text, "Text to search for"))
        .with_parameter(opt("wide", Boolean, false, "Search UTF-16 text"))
        .with_parameter(opt("limit", Integer, 100, "Maximum matches"))
        .with_timeout_class(TimeoutClass::Scan),
        tool(
            "generate_signature",
            ToolCategory::PatternScan,
            "Build a unique byte signature for an address.",
        )
        .with_parameter(address("Address to sign"))
        .with_parameter(req("size", Integer, "Bytes to include")),
        tool(
            "get_memory_regions",
            ToolCategory::PatternScan,
            "List committed memory regions.",
        )
        .with_parameter(opt("max", Integer, 100, "Maximum regions to return")),
        tool(
            "enum_memory_regions_full",
            ToolCategory::PatternScan,
            "Enumerate every memory region with protection and type.",
        )
        .with_parameter(opt("max", Integer, 500, "Maximum regions to return"))
        .with_timeout_class(TimeoutClass::Scan),
    ]
}

pub fn debug_tools() -> Vec<ToolDescriptor> {
    vec![
        tool(
            "disassemble",
            ToolCategory::Debug,
            "Disassemble instructions starting at an address.",
        )
        .with_parameter(address("Start address"))
        .with_parameter(opt("count", Integer, 20, "Number of instructions")),
        tool(
            "get_instruction_info",
            ToolCategory::Debug,
            "Decode the single instruction at an address.",
        )
        .with_parameter(address("Instruction address")),
        tool(
            "find_function_boundaries",
            ToolCategory::Debug,
            "Find the start and end of the function containing an address.",
        )
        .with_parameter(address("Address inside the function"))
        .with_parameter(opt("max_search", Integer, 4096, "Bytes to search in each direction")),
        tool(
            "analyze_function",
            ToolCategory::Debug,
            "Summarize calls, jumps and references of a function.",
        )
        .with_parameter(address("Function start address")),
        tool(
            "find_references",
            ToolCategory::Debug,
            "Find instructions that reference an address.",
        )
        .with_parameter(address("Referenced address"))
        .with_parameter(opt("limit", Integer, 50, "Maximum references"))
        .with_timeout_class(TimeoutClass::Scan),
        tool(
            "find_call_references",
            ToolCategory::Debug,
            "Find call instructions that target an address.",
        )
        .with_parameter(address("Call target"))
        .with_parameter(opt("limit", Integer, 100, "Maximum references"))
        .with_timeout_class(TimeoutClass::Scan),
        tool(
            "dissect_structure",
            ToolCategory::Debug,
            "Guess field types of a structure in memory.",
        )
        .with_parameter(address("Structure base address"))
        .with_parameter(req("size", Integer, "Structure size in bytes")),
    ]
}

pub fn breakpoint_tools() -> Vec<ToolDescriptor> {
    vec![
        tool(
            "set_breakpoint",
            ToolCategory::Breakpoint,
            "Set an execution breakpoint that logs hits without pausing.",
        )
        .with_parameter(address("Instruction address"))
        .with_parameter(ParameterSpec::optional("id", Text).describe("Identifier for later queries"))
        .with_parameter(opt("capture_registers", Boolean, true, "Record registers on hit"))
        .with_parameter(opt("capture_stack", Boolean, false, "Record the stack on hit"))
        .with_parameter(opt("stack_depth", Integer, 16, "Stack entries to record")),
        tool(
            "set_data_breakpoint",
            ToolCategory::Breakpoint,
            "Set a hardware breakpoint on memory access.",
        )
        .with_parameter(address("Watched address"))
        .with_parameter(ParameterSpec::optional("id", Text).describe("Identifier for later queries"))
        .with_parameter(opt("access_type", Text, "w", "r, w or rw"))
        .with_parameter(opt("size", Integer, 4, "Watched bytes (1, 2, 4 or 8)")),
        tool("remove_breakpoint", ToolCategory::Breakpoint, "Remove a breakpoint.")
            .with_parameter(req("id", Text, "Breakpoint identifier")),
        tool(
            "list_breakpoints",
            ToolCategory::Breakpoint,
            "List active breakpoints.",
        )
        .with_timeout_class(TimeoutClass::Quick),
        tool(
            "clear_all_breakpoints",
            ToolCategory::Breakpoint,
            "Remove every breakpoint.",
        ),
        tool(
            "get_breakpoint_hits",
            ToolCategory::Breakpoint,
            "Fetch hits recorded for a breakpoint.",
        )
        .with_parameter(req("id", Text, "Breakpoint identifier"))
        .with_parameter(opt("clear", Boolean, false, "Clear the hits after reading")),
    ]
}

pub fn dbvm_tools() -> Vec<ToolDescriptor> {
    vec![
        tool(
            "get_physical_address",
            ToolCategory::Dbvm,
            "Translate a virtual address to a physical one.",
        )
        .with_parameter(address("Virtual address")),
        tool(
            "start_dbvm_watch",
            ToolCategory::Dbvm,
            "Start a hypervisor-level watch on an address.",
        )
        .with_parameter(address("Watched address"))
        .with_parameter(opt("mode", Text, "w", "r, w or x"))
        .with_parameter(opt("max_entries", Integer, 1000, "Log capacity")),
        tool("stop_dbvm_watch", ToolCategory::Dbvm, "Stop a hypervisor watch.")
            .with_parameter(address("Watched address")),
        tool(
            "poll_dbvm_watch",
            ToolCategory::Dbvm,
            "Read entries logged by a hypervisor watch.",
        )
        .with_parameter(address("Watched address"))
        .with_parameter(opt("max_results", Integer, 1000, "Maximum entries")),
    ]
}

/// Every bridge command, grouped by category.
pub fn bridge_tool_catalog() -> Vec<ToolDescriptor> {
    [
        basic_tools(),
        process_tools(),
        memory_tools(),
        scan_tools(),
        debug_tools(),
        breakpoint_tools(),
        dbvm_tools(),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Registry holding the full catalog and its aliases.
pub fn default_registry() -> Result<ToolRegistry, DomainError> {
    let mut registry = ToolRegistry::new();
    for descriptor in bridge_tool_catalog() {
        registry.register(descriptor)?;
    }
    for (alias, canonical) in TOOL_ALIASES {
        registry.register_alias(*alias, *canonical);
    }
    Ok(registry)
}
