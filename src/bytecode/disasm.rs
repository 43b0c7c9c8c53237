use crate::bytecode::Program;
use crate::frontend::Instruction;

/// Print a listing of a loaded program.
pub fn print_program(program: &Program) {
    println!("════════════════════════════════════════");
    println!(" program");
    println!(
        " {} instructions, {} loops, {} forks",
        program.len(),
        program.jumps().pairs().count(),
        program.fork_count()
    );
    println!("════════════════════════════════════════");
    for line in disassemble(program) {
        println!("{}", line);
    }
}

/// One line per instruction; loop heads (the targets of backward jumps) get a
/// separator and a `►` marker.
pub fn disassemble(program: &Program) -> Vec<String> {
    let mut lines = Vec::with_capacity(program.len());
    let mut depth = 0usize;

    for (ip, instruction) in program.instructions().iter().enumerate() {
        if *instruction == Instruction::LoopClose {
            depth = depth.saturating_sub(1);
        }

        let is_loop_head = *instruction == Instruction::LoopOpen;
        if is_loop_head {
            lines.push(format!("{}      ┌──────────────────────────────────", "  ".repeat(depth)));
        }

        let marker = if is_loop_head { "► " } else { "  " };
        let mut line = format!(
            "{}{:04} {}{:<4}",
            "  ".repeat(depth),
            ip,
            marker,
            instruction.symbol()
        );
        if let Some(target) = program.jump_target(ip) {
            line.push_str(&format!(" -> {:04}", target));
        }
        if let Some(offset) = program.offset(ip) {
            line.push_str(&format!("  ; @{}", offset));
        }
        lines.push(line);

        if is_loop_head {
            depth += 1;
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_marks_loops() {
        let p = Program::load("+[-]").unwrap();
        let lines = disassemble(&p);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "0000   +     ; @0");
        assert!(lines[1].contains('┌'));
        assert_eq!(lines[2], "0001 ► [    -> 0003  ; @1");
        assert_eq!(lines[3], "  0002   -     ; @2");
        assert_eq!(lines[4], "0003   ]    -> 0001  ; @3");
    }

    #[test]
    fn test_listing_fork() {
        let p = Program::load("FORK").unwrap();
        assert_eq!(disassemble(&p), vec!["0000   FORK  ; @0".to_string()]);
    }
}
