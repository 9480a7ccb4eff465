#![deny(unsafe_code)]
#![no_main]
#![no_std]

use io_console::assembler::RxStats;
use io_console::{InputBank, TaskPeriods};
use panic_rtt_target as _panic_handler;

/// board bindings for the io-console collaborator traits
mod board;
/// submodule holding task handlers
mod tasks;

/// Latest sampled button levels. Written by the input sampler only, read
/// without a gate by the command interpreter.
pub(crate) static INPUTS: InputBank = InputBank::new();
/// Current period of every retunable task.
pub(crate) static PERIODS: TaskPeriods = TaskPeriods::new();
/// Receive faults counted by the USART2 interrupt.
pub(crate) static RX_STATS: RxStats = RxStats::new();

/*
 The RTIC application.
 Every periodic job is a software task that re-spawns itself at its next release
 instant; the USART2 interrupt only queues bytes and hands off to `process_rx`.
*/
#[rtic::app(
    device = stm32f4xx_hal::stm32,
    peripherals = true,
    dispatchers=[SPI2, SPI3],
)]
mod app {
    use cortex_m::singleton;
    use heapless::String;
    use io_console::analog::AnalogScale;
    use io_console::assembler::{ByteConsumer, ByteProducer, ByteQueue};
    use io_console::config::PAGE_CAPACITY;
    use io_console::{
        AnalogReading, Channel, LineAssembler, OutputBank, PendingOutputs, Release, Transcript,
    };
    use rtt_target::{rprintln, rtt_init_print};
    use stm32f4xx_hal::{
        adc::{
            config::{AdcConfig, Resolution},
            Adc,
        },
        prelude::*,
        serial,
    };

    use crate::board::{AnalogInput, Buttons, Console, Leds, Receiver, Tick, MONOTONIC_FREQ};

    #[monotonic(binds = SysTick, default = true)]
    type SysMono = crate::board::Mono;

    /// Scale applied to raw ADC codes before they are stored.
    pub(crate) const ANALOG_SCALE: AnalogScale = AnalogScale::Derived;
    const BAUD_RATE: u32 = 115_200;

    /* resources shared across RTIC tasks */
    #[shared]
    struct Shared {
        /// logical output levels, applied to the LEDs by `drive_outputs`
        outputs: OutputBank,
        /// last good analog reading
        analog: AnalogReading,
        /// one latest-wins mailbox per output channel
        pending: PendingOutputs,
        /// last line received and its result
        transcript: Transcript,
    }

    /* resources local to specific RTIC tasks */
    #[local]
    struct Local {
        buttons: Buttons,
        leds: Leds,
        adc: AnalogInput,
        receiver: Option<Receiver>,
        console: Option<Console>,
        rx_producer: ByteProducer<'static>,
        rx_consumer: ByteConsumer<'static>,
        assembler: LineAssembler,
        page: &'static mut String<PAGE_CAPACITY>,
        inputs_release: Release<Tick>,
        analog_release: Release<Tick>,
        outputs_release: Release<Tick>,
        presenter_release: Release<Tick>,
    }

    #[init(local = [rx_queue: ByteQueue = ByteQueue::new()])]
    fn init(ctx: init::Context) -> (Shared, Local, init::Monotonics) {
        /*
            This patch enables the debugger to behave correctly during a WFI
            See Errata: https://www.st.com/content/ccc/resource/technical/document/errata_sheet/c3/6b/f8/32/fc/01/48/6e/DM00155929.pdf/files/DM00155929.pdf/jcr:content/translations/en.DM00155929.pdf#%5B%7B%22num%22%3A37%2C%22gen%22%3A0%7D%2C%7B%22name%22%3A%22XYZ%22%7D%2C67%2C724%2Cnull%5D
            See Also Github: https://github.com/probe-rs/probe-rs/issues/350#issuecomment-740550519
        */
        ctx.device.RCC.ahb1enr.modify(|_, w| w.dma1en().enabled());
        ctx.device.DBGMCU.cr.modify(|_, w| {
            w.dbg_sleep().set_bit();
            w.dbg_standby().set_bit();
            w.dbg_stop().set_bit()
        });

        // Enable RTT logging
        rtt_init_print!();
        rprintln!("io-console booting...");

        let rcc = ctx.device.RCC.constrain();
        let clocks = rcc.cfgr.sysclk(MONOTONIC_FREQ.hz()).freeze();

        /* start RTIC monotonics */
        let mut dcb = ctx.core.DCB;
        let dwt = ctx.core.DWT;
        let systick = ctx.core.SYST;
        let mono = crate::board::Mono::new(&mut dcb, dwt, systick, MONOTONIC_FREQ);
        /* end RTIC monotonics */

        let gpioa = ctx.device.GPIOA.split();
        let gpiob = ctx.device.GPIOB.split();
        let gpioc = ctx.device.GPIOC.split();

        // buttons pull to ground when pressed
        let buttons = Buttons([
            gpioc.pc0.into_pull_up_input().erase(),
            gpioc.pc1.into_pull_up_input().erase(),
            gpioc.pc2.into_pull_up_input().erase(),
            gpioc.pc3.into_pull_up_input().erase(),
        ]);
        let leds = Leds([
            gpiob.pb0.into_push_pull_output().erase(),
            gpiob.pb1.into_push_pull_output().erase(),
            gpiob.pb2.into_push_pull_output().erase(),
            gpiob.pb3.into_push_pull_output().erase(),
        ]);

        let adc = AnalogInput {
            adc: Adc::adc1(
                ctx.device.ADC1,
                true,
                AdcConfig::default().resolution(Resolution::Ten),
            ),
            pin: gpioa.pa1.into_analog(),
        };

        // USART2 is routed to the ST-LINK virtual COM port.
        let usart2_tx = gpioa.pa2.into_alternate();
        let usart2_rx = gpioa.pa3.into_alternate();
        let usart2_config = serial::config::Config {
            baudrate: BAUD_RATE.bps(),
            wordlength: serial::config::WordLength::DataBits8,
            parity: serial::config::Parity::ParityNone,
            stopbits: serial::config::StopBits::STOP1,
            dma: serial::config::DmaConfig::None,
        };
        let (console, receiver) = match serial::Serial::new(
            ctx.device.USART2,
            (usart2_tx, usart2_rx),
            usart2_config,
            clocks,
        ) {
            Ok(usart2) => {
                let (tx, mut rx) = usart2.split();
                rx.listen();
                (Some(Console(tx)), Some(Receiver(rx)))
            }
            Err(_) => {
                // the rest of the device keeps running, just without a console
                rprintln!("[ERROR] failed to configure USART2, commands are disabled.");
                (None, None)
            }
        };

        let (rx_producer, rx_consumer) = ctx.local.rx_queue.split();
        let page: &'static mut String<PAGE_CAPACITY> =
            singleton!(: String<PAGE_CAPACITY> = String::new()).expect("page buffer already taken.");

        // kick off the periodic tasks.
        sample_inputs::spawn().expect("failed to kick off the input sampler.");
        sample_analog::spawn().expect("failed to kick off the analog sampler.");
        drive_outputs::spawn().expect("failed to kick off the output driver.");
        present_status::spawn().expect("failed to kick off the presenter.");

        rprintln!("init complete.");
        (
            Shared {
                outputs: OutputBank::new(),
                analog: AnalogReading::default(),
                pending: PendingOutputs::new(),
                transcript: Transcript::new(),
            },
            Local {
                buttons,
                leds,
                adc,
                receiver,
                console,
                rx_producer,
                rx_consumer,
                assembler: LineAssembler::new(),
                page,
                inputs_release: Release::new(),
                analog_release: Release::new(),
                outputs_release: Release::new(),
                presenter_release: Release::new(),
            },
            init::Monotonics(mono),
        )
    }

    /* bring externed tasks into scope */
    use crate::tasks::{
        apply_output, drive_outputs, on_usart2, present_status, process_rx, sample_analog,
        sample_inputs,
    };

    // RTIC docs specify we can modularize the code by using these `extern` blocks.
    // This allows us to specify the tasks in other modules and still work within
    // RTIC's infrastructure.
    extern "Rust" {
        // USART2 receive interrupt, queues bytes for `process_rx`
        #[task(binds=USART2, priority=2, local=[receiver, rx_producer])]
        fn on_usart2(context: on_usart2::Context);

        // line assembly and command interpretation
        #[task(local=[rx_consumer, assembler], shared=[analog, pending, transcript])]
        fn process_rx(context: process_rx::Context);

        // applies one channel's pending output level.
        // one wake-up per channel at most, so capacity = CHANNELS.
        #[task(capacity=4, shared=[pending, outputs])]
        fn apply_output(context: apply_output::Context, channel: Channel);

        // periodic tasks
        #[task(local=[buttons, inputs_release])]
        fn sample_inputs(context: sample_inputs::Context);

        #[task(local=[adc, analog_release], shared=[analog])]
        fn sample_analog(context: sample_analog::Context);

        #[task(local=[leds, outputs_release], shared=[outputs])]
        fn drive_outputs(context: drive_outputs::Context);

        #[task(local=[console, page, presenter_release], shared=[transcript])]
        fn present_status(context: present_status::Context);
    }
}
