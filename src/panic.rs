// Author: Lukas Bower
// Purpose: Defines the panic handler for bare-metal builds.

use core::fmt::Write;
use core::panic::PanicInfo;

use heapless::String;

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    let mut line = String::<192>::new();
    let _ = write!(&mut line, "[PANIC] {info}");
    crate::board::uart::debug_puts(line.as_str());
    loop {
        core::hint::spin_loop();
    }
}
