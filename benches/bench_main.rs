//! smallsh ベンチマーク: `$$` 展開、パーサー、ビルトイン、fork + exec + wait の計測。
//!
//! `std::time::Instant` による手動計測（外部クレート不要）。
//!
//! 実行: `cargo bench`

use std::time::{Duration, Instant};

// ── ベンチマークインフラ ──────────────────────────────────────────

struct BenchResult {
    category: &'static str,
    name: &'static str,
    avg: Duration,
    iters: u64,
}

impl BenchResult {
    fn print(&self) {
        let avg_us = self.avg.as_nanos() as f64 / 1000.0;
        println!(
            "[{:<8}] {:<40}: avg {:>10.2}µs  ({} iters)",
            self.category, self.name, avg_us, self.iters,
        );
    }
}

fn bench<F: FnMut()>(category: &'static str, name: &'static str, iters: u64, mut f: F) -> BenchResult {
    // ウォームアップ
    for _ in 0..iters.min(100) {
        f();
    }

    let start = Instant::now();
    for _ in 0..iters {
        f();
    }
    let elapsed = start.elapsed();

    BenchResult {
        category,
        name,
        avg: elapsed / iters as u32,
        iters,
    }
}

fn print_all(results: &mut Vec<BenchResult>) {
    for r in results.iter() {
        r.print();
    }
    results.clear();
}

// ── メイン ────────────────────────────────────────────────────────

fn main() {
    println!("smallsh benchmark suite");
    println!("{}", "=".repeat(80));

    let mut results = Vec::new();

    // ── 展開ベンチマーク ──
    println!("\n--- Expand ---");

    results.push(bench("expand", "no marker (borrowed)", 10_000, || {
        let _ = smallsh::expand::expand_pid("ls -la /tmp", 1234);
    }));

    results.push(bench("expand", "echo $$-$$", 10_000, || {
        let _ = smallsh::expand::expand_pid("echo $$-$$", 1234);
    }));

    print_all(&mut results);

    // ── パーサーベンチマーク ──
    println!("\n--- Parser ---");

    results.push(bench("parser", "echo hello", 10_000, || {
        let _ = smallsh::parser::parse("echo hello", true);
    }));

    results.push(bench("parser", "sort < in.txt > out.txt", 10_000, || {
        let _ = smallsh::parser::parse("sort < in.txt > out.txt", true);
    }));

    results.push(bench("parser", "sleep 1 &", 10_000, || {
        let _ = smallsh::parser::parse("sleep 1 &", true);
    }));

    results.push(bench("parser", "# comment", 10_000, || {
        let _ = smallsh::parser::parse("# comment", true);
    }));

    print_all(&mut results);

    // ── ビルトインベンチマーク ──
    println!("\n--- Builtins ---");

    let mut shell = smallsh::shell::Shell::new();

    results.push(bench("builtin", "status", 10_000, || {
        let mut buf = Vec::new();
        let _ = smallsh::builtins::try_exec(&mut shell, &["status"], &mut buf);
    }));

    print_all(&mut results);

    // ── spawn ベンチマーク ──
    println!("\n--- Spawn (fork + execvp) ---");

    let redirects = match smallsh::spawn::Redirects::new(None, Some("/dev/null")) {
        Ok(r) => r,
        Err(_) => return,
    };

    results.push(bench("spawn", "/bin/true + wait", 1_000, || {
        if let Ok(pid) = smallsh::spawn::spawn(&["/bin/true"], &redirects, false) {
            let _ = smallsh::job::wait_for_fg(pid);
        }
    }));

    print_all(&mut results);

    // ── フルパイプライン (parse → execute) ──
    println!("\n--- Full pipeline (parse + spawn + wait) ---");

    results.push(bench("full", "/bin/echo hello > /dev/null", 1_000, || {
        if let Ok(Some(cmd)) = smallsh::parser::parse("/bin/echo hello > /dev/null", true) {
            let mut out = Vec::new();
            let _ = smallsh::executor::execute(&mut shell, &cmd, &mut out);
        }
    }));

    print_all(&mut results);

    println!("\n{}", "=".repeat(80));
    println!("done.");
}
